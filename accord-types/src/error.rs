use thiserror::Error;

use crate::primitives::PartyId;

/// All error conditions surfaced by the Accord protocol core.
///
/// Every variant bubbles to the caller of the top-level flow; none is
/// retried automatically. `Protocol` signals an implementation defect
/// (malformed handshake), not a domain condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccordError {
    /// A domain rule failed. The message is the violated rule's
    /// description, verbatim.
    #[error("rule violated: {0}")]
    RuleViolation(String),

    /// An Update referenced a prior agreement that does not exist in
    /// the caller's vault for exactly these partners.
    #[error("no unconsumed agreement found for partners {0:?}")]
    AgreementNotFound(Vec<PartyId>),

    /// The counterparty declined to endorse the proposal.
    #[error("counterparty {party:?} rejected the proposal: {reason}")]
    RejectedByCounterparty { party: PartyId, reason: String },

    /// The external commit/consensus service refused the transition.
    #[error("commit failed: {reason}")]
    Commit { reason: String },

    /// Malformed handshake or unrecognized message. Fatal; indicates
    /// an implementation defect rather than a domain condition.
    #[error("protocol error: {reason}")]
    Protocol { reason: String },

    /// An endorsement failed cryptographic verification.
    #[error("invalid signature from party {party:?}")]
    InvalidSignature { party: PartyId },

    /// A public key could not be parsed.
    #[error("invalid key material")]
    InvalidKeyMaterial,

    /// Canonical encoding of transition content failed.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// The party's vault failed.
    #[error("ledger error: {reason}")]
    Ledger { reason: String },
}
