use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use accord_crypto::keys::{verify, Keypair};
use accord_crypto::party::pubkey_to_party;
use accord_types::error::AccordError;
use accord_types::message::{SignatureRequest, SignatureResponse};
use accord_types::primitives::PartyId;
use accord_types::transition::{Endorsement, Transition, TransitionKind};

use crate::builder::compute_transition_id;
use crate::rules::validate_transition;

/// Point-to-point delivery of a proposal to a named counterparty and
/// return of its response. Delivery is assumed reliable, ordered, and
/// exactly-once per handshake; an unreachable counterparty is a
/// [`AccordError::Protocol`] failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request_signature(
        &self,
        to: &PartyId,
        request: SignatureRequest,
    ) -> Result<SignatureResponse, AccordError>;
}

/// Initiator-side progress through the signature collection handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectState {
    Built,
    AwaitingCounterSignature,
    FullySigned,
    Rejected,
}

/// Responder-side progress through one received proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespondState {
    Received,
    Validating,
    Signed,
    Rejected,
}

/// Drive the two-party handshake until every required signer has
/// endorsed the transition.
///
/// Each missing signer (exactly one counterparty for a bilateral
/// agreement) is sent the partially-signed transition. A `Signed`
/// response is verified and merged; a `Rejected` response terminates
/// the handshake with [`AccordError::RejectedByCounterparty`] carrying
/// the responder's stated reason. No retry is attempted and no partial
/// progress is persisted.
pub async fn collect_signatures(
    mut transition: Transition,
    transport: &dyn Transport,
) -> Result<Transition, AccordError> {
    let mut state = CollectState::Built;
    debug!(?state, id = ?transition.id, "starting signature collection");

    let missing: Vec<PartyId> = transition.missing_signers().copied().collect();
    for counterparty in missing {
        state = CollectState::AwaitingCounterSignature;
        debug!(?state, party = ?counterparty, "requesting counterparty signature");

        let request = SignatureRequest {
            transition: transition.clone(),
        };
        match transport.request_signature(&counterparty, request).await? {
            SignatureResponse::Signed { party, endorsement } => {
                merge_endorsement(&mut transition, &counterparty, party, endorsement)?;
            }
            SignatureResponse::Rejected { party, reason } => {
                state = CollectState::Rejected;
                debug!(?state, party = ?party, reason = %reason, "counterparty rejected proposal");
                return Err(AccordError::RejectedByCounterparty { party, reason });
            }
        }
    }

    state = CollectState::FullySigned;
    debug!(?state, id = ?transition.id, "all signatures collected");
    Ok(transition)
}

/// Verify a returned endorsement and merge it into the transition.
fn merge_endorsement(
    transition: &mut Transition,
    expected: &PartyId,
    party: PartyId,
    endorsement: Endorsement,
) -> Result<(), AccordError> {
    if party != *expected {
        return Err(AccordError::Protocol {
            reason: format!("response from {party:?}, expected {expected:?}"),
        });
    }
    if pubkey_to_party(&endorsement.pubkey) != party {
        return Err(AccordError::Protocol {
            reason: "endorsement key does not match responding party".to_string(),
        });
    }
    if !transition.required_signers.contains(&party) {
        return Err(AccordError::Protocol {
            reason: format!("party {party:?} is not a required signer"),
        });
    }
    verify(&transition.id, &endorsement.signature, &endorsement.pubkey)?;
    transition.endorsements.insert(party, endorsement);
    Ok(())
}

/// Flow-specific validation injected into the responder, one per
/// transition kind. Receives the proposal and the responder's own
/// identity.
pub type ProposalCheck = Arc<dyn Fn(&Transition, &PartyId) -> Result<(), AccordError> + Send + Sync>;

/// The responder half of the handshake, callable through a transport.
#[async_trait]
pub trait ResponderService: Send + Sync {
    async fn handle(&self, request: SignatureRequest) -> SignatureResponse;
}

/// Standard responder: one fixed handshake specialized per proposal
/// type by injected [`ProposalCheck`]s rather than by subtyping.
pub struct Responder {
    keypair: Arc<Keypair>,
    party_id: PartyId,
    issue_check: ProposalCheck,
    update_check: ProposalCheck,
}

impl Responder {
    /// Create a responder that accepts any rule-valid proposal.
    pub fn new(keypair: Arc<Keypair>) -> Self {
        let party_id = pubkey_to_party(&keypair.public_key());
        Self {
            keypair,
            party_id,
            issue_check: Arc::new(|_, _| Ok(())),
            update_check: Arc::new(|_, _| Ok(())),
        }
    }

    /// Replace the check applied to Issue proposals.
    pub fn with_issue_check(mut self, check: ProposalCheck) -> Self {
        self.issue_check = check;
        self
    }

    /// Replace the check applied to Update proposals.
    pub fn with_update_check(mut self, check: ProposalCheck) -> Self {
        self.update_check = check;
        self
    }

    /// The responder's party identifier.
    pub fn party_id(&self) -> PartyId {
        self.party_id
    }

    /// Validate a received proposal and, if acceptable, produce our
    /// endorsement. Returns the violated rule or protocol fault
    /// otherwise.
    fn check_proposal(&self, transition: &Transition) -> Result<Endorsement, AccordError> {
        if compute_transition_id(transition) != transition.id {
            return Err(AccordError::Protocol {
                reason: "transition id does not match content".to_string(),
            });
        }
        for (party, endorsement) in &transition.endorsements {
            if pubkey_to_party(&endorsement.pubkey) != *party {
                return Err(AccordError::Protocol {
                    reason: "endorsement key does not match its party".to_string(),
                });
            }
            verify(&transition.id, &endorsement.signature, &endorsement.pubkey)?;
        }
        validate_transition(transition)?;
        let check = match &transition.kind {
            TransitionKind::Issue { .. } => &self.issue_check,
            TransitionKind::Update => &self.update_check,
        };
        (check)(transition, &self.party_id)?;
        if !transition.required_signers.contains(&self.party_id) {
            return Err(AccordError::Protocol {
                reason: "proposal does not require our signature".to_string(),
            });
        }
        Ok(Endorsement {
            pubkey: self.keypair.public_key(),
            signature: self.keypair.sign(&transition.id),
        })
    }
}

#[async_trait]
impl ResponderService for Responder {
    async fn handle(&self, request: SignatureRequest) -> SignatureResponse {
        let mut state = RespondState::Received;
        debug!(?state, id = ?request.transition.id, "received signature request");

        state = RespondState::Validating;
        debug!(?state, "running pre-check");
        match self.check_proposal(&request.transition) {
            Ok(endorsement) => {
                state = RespondState::Signed;
                debug!(?state, "endorsing proposal");
                SignatureResponse::Signed {
                    party: self.party_id,
                    endorsement,
                }
            }
            Err(err) => {
                state = RespondState::Rejected;
                // Rule descriptions travel verbatim; other failures
                // keep their display form.
                let reason = match err {
                    AccordError::RuleViolation(description) => description,
                    other => other.to_string(),
                };
                debug!(?state, reason = %reason, "rejecting proposal");
                SignatureResponse::Rejected {
                    party: self.party_id,
                    reason,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use accord_types::agreement::Agreement;

    use super::*;
    use crate::builder::{endorse, TransitionBuilder};

    fn setup() -> (Keypair, Arc<Keypair>, Transition) {
        let initiator = Keypair::from_seed(&[1u8; 32]);
        let responder_kp = Arc::new(Keypair::from_seed(&[2u8; 32]));
        let state = Agreement::new([
            pubkey_to_party(&initiator.public_key()),
            pubkey_to_party(&responder_kp.public_key()),
        ]);
        let mut transition = TransitionBuilder::issue(state).build();
        endorse(&mut transition, &initiator).unwrap();
        (initiator, responder_kp, transition)
    }

    #[tokio::test]
    async fn test_responder_signs_valid_proposal() {
        let (_, responder_kp, transition) = setup();
        let responder = Responder::new(responder_kp);
        let response = responder
            .handle(SignatureRequest {
                transition: transition.clone(),
            })
            .await;
        match response {
            SignatureResponse::Signed { party, endorsement } => {
                assert_eq!(party, responder.party_id());
                assert!(verify(&transition.id, &endorsement.signature, &endorsement.pubkey).is_ok());
            }
            SignatureResponse::Rejected { reason, .. } => {
                panic!("expected signature, got rejection: {reason}")
            }
        }
    }

    #[tokio::test]
    async fn test_responder_rejects_rule_violation_with_description() {
        let (initiator, responder_kp, _) = setup();
        let state = Agreement::new([
            pubkey_to_party(&initiator.public_key()),
            pubkey_to_party(&responder_kp.public_key()),
        ]);
        // An Issue that already carries a project violates the rules.
        let mut transition = TransitionBuilder::issue(state.with_project("Project X")).build();
        endorse(&mut transition, &initiator).unwrap();

        let responder = Responder::new(responder_kp);
        let response = responder.handle(SignatureRequest { transition }).await;
        match response {
            SignatureResponse::Rejected { reason, .. } => {
                assert_eq!(reason, "Must be no projects for a new agreement");
            }
            SignatureResponse::Signed { .. } => panic!("expected rejection"),
        }
    }

    #[tokio::test]
    async fn test_responder_rejects_tampered_content() {
        let (_, responder_kp, mut transition) = setup();
        // Mutate content without recomputing the id.
        transition.new_state = transition.new_state.with_project("Project Sneaky");
        let responder = Responder::new(responder_kp);
        let response = responder.handle(SignatureRequest { transition }).await;
        assert!(matches!(response, SignatureResponse::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_responder_rejects_forged_initiator_endorsement() {
        let (_, responder_kp, mut transition) = setup();
        let forged_party = *transition.endorsements.keys().next().unwrap();
        if let Some(endorsement) = transition.endorsements.get_mut(&forged_party) {
            endorsement.signature[0] ^= 0xff;
        }
        let responder = Responder::new(responder_kp);
        let response = responder.handle(SignatureRequest { transition }).await;
        assert!(matches!(response, SignatureResponse::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_responder_applies_injected_check() {
        let (_, responder_kp, transition) = setup();
        let responder = Responder::new(responder_kp).with_issue_check(Arc::new(|_, _| {
            Err(AccordError::RuleViolation("not today".to_string()))
        }));
        let response = responder.handle(SignatureRequest { transition }).await;
        match response {
            SignatureResponse::Rejected { reason, .. } => assert_eq!(reason, "not today"),
            SignatureResponse::Signed { .. } => panic!("expected rejection"),
        }
    }
}
