use std::collections::{BTreeMap, BTreeSet};

use borsh::BorshSerialize;

use accord_crypto::hash::blake3_hash;
use accord_crypto::keys::Keypair;
use accord_crypto::party::pubkey_to_party;
use accord_types::agreement::Agreement;
use accord_types::error::AccordError;
use accord_types::primitives::{StateRef, TransitionId};
use accord_types::transition::{Endorsement, PriorState, Transition, TransitionKind};

/// Builder for candidate transitions. Derives the required signer set
/// from the states involved and computes the content id.
pub struct TransitionBuilder {
    kind: TransitionKind,
    prior: Option<PriorState>,
    new_state: Agreement,
}

impl TransitionBuilder {
    /// Start an Issue transition forming the given agreement. Every
    /// partner of the new state must sign. A fresh nonce keeps
    /// repeated issuances between the same partners distinct.
    pub fn issue(new_state: Agreement) -> Self {
        Self {
            kind: TransitionKind::Issue {
                nonce: rand::random(),
            },
            prior: None,
            new_state,
        }
    }

    /// Start an Update transition consuming `prior` and producing
    /// `new_state`. Every partner of the prior state must sign.
    pub fn update(state_ref: StateRef, prior: Agreement, new_state: Agreement) -> Self {
        Self {
            kind: TransitionKind::Update,
            prior: Some(PriorState {
                state_ref,
                state: prior,
            }),
            new_state,
        }
    }

    /// Assemble the transition, with no endorsements yet.
    pub fn build(self) -> Transition {
        let required_signers: BTreeSet<_> = match &self.prior {
            Some(prior) => prior.state.partners.clone(),
            None => self.new_state.partners.clone(),
        };
        let mut transition = Transition {
            id: [0u8; 32],
            kind: self.kind,
            prior: self.prior,
            new_state: self.new_state,
            required_signers,
            endorsements: BTreeMap::new(),
        };
        transition.id = compute_transition_id(&transition);
        transition
    }
}

/// Compute the transition id by hashing all fields except the
/// endorsements.
pub fn compute_transition_id(transition: &Transition) -> TransitionId {
    let mut data = Vec::new();
    transition
        .kind
        .serialize(&mut data)
        .expect("serialization should not fail");
    transition
        .prior
        .serialize(&mut data)
        .expect("serialization should not fail");
    transition
        .new_state
        .serialize(&mut data)
        .expect("serialization should not fail");
    transition
        .required_signers
        .serialize(&mut data)
        .expect("serialization should not fail");
    blake3_hash(&data)
}

/// Sign the transition id with the given keypair and merge the
/// endorsement. Fails if the keypair's party is not a required signer.
pub fn endorse(transition: &mut Transition, keypair: &Keypair) -> Result<(), AccordError> {
    let pubkey = keypair.public_key();
    let party = pubkey_to_party(&pubkey);
    if !transition.required_signers.contains(&party) {
        return Err(AccordError::Protocol {
            reason: format!("party {party:?} is not a required signer"),
        });
    }
    let signature = keypair.sign(&transition.id);
    transition
        .endorsements
        .insert(party, Endorsement { pubkey, signature });
    Ok(())
}
