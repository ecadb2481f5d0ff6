use async_trait::async_trait;
use tracing::debug;

use accord_crypto::keys::verify;
use accord_crypto::party::pubkey_to_party;
use accord_types::error::AccordError;
use accord_types::transition::{CommittedRecord, Transition, TransitionKind};

use crate::rules::validate_transition;

/// External commit/consensus collaborator. Provides cross-party
/// atomicity and single-spend enforcement over prior states; this
/// core only orchestrates the call and interprets the result.
#[async_trait]
pub trait CommitService: Send + Sync {
    async fn commit(&self, transition: Transition) -> Result<CommittedRecord, AccordError>;
}

/// Finalize a fully-signed transition.
///
/// Runs the rule engine a second time as the authoritative gate —
/// responders already validated, so a failure here indicates a buggy
/// or compromised responder and is fatal for the attempt. On success
/// the commit service persists the new state and the prior state's
/// consumption to every party's ledger; either the committed record
/// is obtained or the whole operation fails with no partial commit
/// visible to the initiator.
pub async fn finalize(
    transition: Transition,
    notary: &dyn CommitService,
) -> Result<CommittedRecord, AccordError> {
    if !transition.is_fully_signed() {
        let description = match &transition.kind {
            TransitionKind::Issue { .. } => "All partners must sign agreement",
            TransitionKind::Update => "All partners must approve projects",
        };
        return Err(AccordError::RuleViolation(description.to_string()));
    }

    for (party, endorsement) in &transition.endorsements {
        if pubkey_to_party(&endorsement.pubkey) != *party {
            return Err(AccordError::Protocol {
                reason: "endorsement key does not match its party".to_string(),
            });
        }
        verify(&transition.id, &endorsement.signature, &endorsement.pubkey)?;
    }

    validate_transition(&transition)?;

    debug!(id = ?transition.id, "submitting transition for commit");
    let record = notary.commit(transition).await?;
    debug!(id = ?record.transition.id, notary = ?record.notary, "transition committed");
    Ok(record)
}
