use std::collections::{BTreeMap, BTreeSet};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::agreement::Agreement;
use crate::primitives::*;

/// The kind of state change a transition performs.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Formation of a new agreement. The nonce makes two otherwise
    /// identical issuances produce distinct transition ids.
    Issue { nonce: Nonce },
    /// Evolution of an existing agreement (one project added).
    Update,
}

impl TransitionKind {
    /// True for Issue transitions.
    pub fn is_issue(&self) -> bool {
        matches!(self, TransitionKind::Issue { .. })
    }
}

/// The prior state an Update transition consumes, carried by value so
/// the counterparty can validate the proposal without a vault lookup.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct PriorState {
    /// Ledger reference to the consumed state.
    pub state_ref: StateRef,
    /// The consumed state's content.
    pub state: Agreement,
}

/// One party's signature over a transition id.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Endorsement {
    /// The endorsing party's public key.
    pub pubkey: PublicKey,
    /// Ed25519 signature over the transition id.
    #[serde(with = "crate::primitives::serde_sig")]
    pub signature: Signature,
}

/// A proposed change from a prior agreement state (or none, for
/// Issue) to a new one.
///
/// The initiator owns the transition until commit; endorsements are
/// merged in as the signature collection protocol progresses. A
/// transition is committable only once `endorsements` covers exactly
/// `required_signers`.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Transition {
    /// Unique identifier: BLAKE3 of all fields except `endorsements`.
    pub id: TransitionId,
    /// What this transition does.
    pub kind: TransitionKind,
    /// The state being consumed. Absent for Issue.
    pub prior: Option<PriorState>,
    /// The proposed successor state.
    pub new_state: Agreement,
    /// Identities whose endorsement is mandatory.
    pub required_signers: BTreeSet<PartyId>,
    /// Endorsements collected so far, keyed by party.
    pub endorsements: BTreeMap<PartyId, Endorsement>,
}

impl Transition {
    /// The required signers that have not endorsed yet.
    pub fn missing_signers(&self) -> impl Iterator<Item = &PartyId> {
        self.required_signers
            .iter()
            .filter(|party| !self.endorsements.contains_key(*party))
    }

    /// True once every required signer has endorsed.
    pub fn is_fully_signed(&self) -> bool {
        self.required_signers.len() == self.endorsements.len()
            && self
                .required_signers
                .iter()
                .all(|party| self.endorsements.contains_key(party))
    }
}

/// The finalized, fully-signed record returned by the commit service.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct CommittedRecord {
    /// The committed transition, complete with all endorsements.
    pub transition: Transition,
    /// The notary that accepted the transition.
    pub notary: PartyId,
}

impl CommittedRecord {
    /// Ledger reference to the state this record produced.
    pub fn state_ref(&self) -> StateRef {
        StateRef {
            transition_id: self.transition.id,
        }
    }

    /// The agreement state this record produced.
    pub fn state(&self) -> &Agreement {
        &self.transition.new_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agreement::Agreement;

    fn make_transition() -> Transition {
        Transition {
            id: [7u8; 32],
            kind: TransitionKind::Issue { nonce: 42 },
            prior: None,
            new_state: Agreement::new([[1u8; 20], [2u8; 20]]),
            required_signers: [[1u8; 20], [2u8; 20]].into_iter().collect(),
            endorsements: BTreeMap::new(),
        }
    }

    #[test]
    fn test_missing_signers_shrinks_as_endorsements_arrive() {
        let mut transition = make_transition();
        assert_eq!(transition.missing_signers().count(), 2);

        transition.endorsements.insert(
            [1u8; 20],
            Endorsement {
                pubkey: [0u8; 32],
                signature: [0u8; 64],
            },
        );
        let missing: Vec<_> = transition.missing_signers().copied().collect();
        assert_eq!(missing, vec![[2u8; 20]]);
        assert!(!transition.is_fully_signed());
    }

    #[test]
    fn test_fully_signed_requires_every_required_signer() {
        let mut transition = make_transition();
        for party in [[1u8; 20], [2u8; 20]] {
            transition.endorsements.insert(
                party,
                Endorsement {
                    pubkey: [0u8; 32],
                    signature: [0u8; 64],
                },
            );
        }
        assert!(transition.is_fully_signed());
    }

    #[test]
    fn test_extra_endorsement_from_non_required_party_does_not_count() {
        let mut transition = make_transition();
        transition.endorsements.insert(
            [9u8; 20],
            Endorsement {
                pubkey: [0u8; 32],
                signature: [0u8; 64],
            },
        );
        transition.endorsements.insert(
            [1u8; 20],
            Endorsement {
                pubkey: [0u8; 32],
                signature: [0u8; 64],
            },
        );
        assert!(!transition.is_fully_signed());
    }
}
