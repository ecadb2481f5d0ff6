use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use accord_crypto::keys::Keypair;
use accord_ledger::traits::KvStore;
use accord_types::agreement::Agreement;
use accord_types::error::AccordError;
use accord_types::primitives::{PartyId, StateRef};
use accord_types::transition::{CommittedRecord, Transition};

use crate::builder::{endorse, TransitionBuilder};
use crate::commit::finalize;
use crate::handshake::{collect_signatures, Responder};
use crate::party::PartyNode;
use crate::rules::validate_transition;

/// Propose a new partnership between ourselves and `partner`.
///
/// Builds the empty agreement, then runs the generic
/// create-bilateral-agreement flow.
pub async fn propose_partnership<S: KvStore>(
    node: &PartyNode<S>,
    partner: PartyId,
) -> Result<CommittedRecord, AccordError> {
    info!(partner = ?partner, "proposing partnership");
    let state = Agreement::new([node.party_id(), partner]);
    create_bilateral_agreement(node, state).await
}

/// Propose adding a project to an existing partnership with `partner`.
///
/// Resolves the unconsumed agreement for exactly `{us, partner}` —
/// an exact partner-set lookup — and runs the generic
/// update-bilateral-agreement flow on its successor.
pub async fn propose_project<S: KvStore>(
    node: &PartyNode<S>,
    partner: PartyId,
    name: &str,
) -> Result<CommittedRecord, AccordError> {
    info!(partner = ?partner, project = %name, "proposing project");
    let partners: BTreeSet<PartyId> = [node.party_id(), partner].into_iter().collect();
    let (state_ref, prior) = node
        .vault()
        .find_unconsumed_by_partners(&partners)?
        .ok_or_else(|| AccordError::AgreementNotFound(partners.iter().copied().collect()))?;
    let new_state = prior.with_project(name);
    update_bilateral_agreement(node, state_ref, prior, new_state).await
}

/// Create a generic bilateral agreement: build the Issue transition,
/// self-sign, pre-check, collect the counterparty's endorsement, and
/// finalize.
pub async fn create_bilateral_agreement<S: KvStore>(
    node: &PartyNode<S>,
    state: Agreement,
) -> Result<CommittedRecord, AccordError> {
    debug!("creating transition");
    let mut transition = TransitionBuilder::issue(state).build();
    debug!("signing transition");
    endorse(&mut transition, node.keypair())?;
    validate_transition(&transition)?;
    debug!("collecting signatures");
    let transition = collect_signatures(transition, node.transport()).await?;
    debug!("finalising transition");
    finalize(transition, node.notary()).await
}

/// Update a generic bilateral agreement: consume `prior`, produce
/// `new_state`, and run the same sign/collect/finalize sequence.
pub async fn update_bilateral_agreement<S: KvStore>(
    node: &PartyNode<S>,
    state_ref: StateRef,
    prior: Agreement,
    new_state: Agreement,
) -> Result<CommittedRecord, AccordError> {
    debug!("creating transition");
    let mut transition = TransitionBuilder::update(state_ref, prior, new_state).build();
    debug!("signing transition");
    endorse(&mut transition, node.keypair())?;
    validate_transition(&transition)?;
    debug!("collecting signatures");
    let transition = collect_signatures(transition, node.transport()).await?;
    debug!("finalising transition");
    finalize(transition, node.notary()).await
}

/// Responder check for Issue proposals: the proposal must concern a
/// new partnership agreement that includes us.
pub fn partnership_issue_check(
    transition: &Transition,
    responder: &PartyId,
) -> Result<(), AccordError> {
    if transition.new_state.partners.contains(responder) {
        Ok(())
    } else {
        Err(AccordError::RuleViolation(
            "Received a proposal that doesn't concern a new partnership agreement".to_string(),
        ))
    }
}

/// Responder check for Update proposals: the consumed agreement must
/// be one we are a partner of.
pub fn partnership_update_check(
    transition: &Transition,
    responder: &PartyId,
) -> Result<(), AccordError> {
    let concerns_us = transition
        .prior
        .as_ref()
        .is_some_and(|prior| prior.state.partners.contains(responder));
    if concerns_us {
        Ok(())
    } else {
        Err(AccordError::RuleViolation(
            "Received a proposal that doesn't concern a partnership agreement".to_string(),
        ))
    }
}

/// The standard partnership responder: the shared sign-and-check
/// handshake specialized with the two checks above.
pub fn partnership_responder(keypair: Arc<Keypair>) -> Responder {
    Responder::new(keypair)
        .with_issue_check(Arc::new(|transition, responder| {
            partnership_issue_check(transition, responder)
        }))
        .with_update_check(Arc::new(|transition, responder| {
            partnership_update_check(transition, responder)
        }))
}
