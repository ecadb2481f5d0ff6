use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::primitives::PartyId;
use crate::transition::{Endorsement, Transition};

/// A proposal sent to a required signer during signature collection.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SignatureRequest {
    /// The partially-signed transition the counterparty is asked to
    /// endorse.
    pub transition: Transition,
}

/// The counterparty's answer to a [`SignatureRequest`].
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum SignatureResponse {
    /// The responder validated the proposal and endorsed it.
    Signed {
        /// The responding party.
        party: PartyId,
        /// Its endorsement over the transition id.
        endorsement: Endorsement,
    },
    /// The responder declined, with the violated rule's description.
    Rejected {
        /// The responding party.
        party: PartyId,
        /// The responder's stated reason, surfaced verbatim.
        reason: String,
    },
}
