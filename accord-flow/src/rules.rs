use accord_types::error::AccordError;
use accord_types::transition::{Transition, TransitionKind};

/// A validation rule: a predicate over a transition, tagged with the
/// human-readable description surfaced verbatim when it fails.
pub struct Rule {
    /// What the rule requires, in the words shown to the caller.
    pub description: &'static str,
    /// The predicate. True means the rule holds.
    pub check: fn(&Transition) -> bool,
}

fn issue_no_prior(transition: &Transition) -> bool {
    transition.prior.is_none()
}

fn issue_at_least_two_partners(transition: &Transition) -> bool {
    transition.new_state.partners.len() > 1
}

fn issue_no_projects(transition: &Transition) -> bool {
    transition.new_state.projects.is_empty()
}

fn issue_all_partners_sign(transition: &Transition) -> bool {
    transition.required_signers == transition.new_state.partners
}

fn update_one_prior(transition: &Transition) -> bool {
    transition.prior.is_some()
}

fn update_one_project_added(transition: &Transition) -> bool {
    match &transition.prior {
        Some(prior) => {
            transition.new_state.projects.len() == prior.state.projects.len() + 1
                && transition.new_state.projects.starts_with(&prior.state.projects)
        }
        None => false,
    }
}

fn update_project_name_prefix(transition: &Transition) -> bool {
    transition
        .new_state
        .projects
        .last()
        .is_some_and(|name| name.starts_with("Project "))
}

fn update_all_partners_approve(transition: &Transition) -> bool {
    match &transition.prior {
        Some(prior) => {
            transition.required_signers == prior.state.partners
                && transition.new_state.partners == prior.state.partners
        }
        None => false,
    }
}

/// Ordered rules for Issue transitions.
pub const ISSUE_RULES: &[Rule] = &[
    Rule {
        description: "Must be no inputs",
        check: issue_no_prior,
    },
    Rule {
        description: "Must be at least two partners",
        check: issue_at_least_two_partners,
    },
    Rule {
        description: "Must be no projects for a new agreement",
        check: issue_no_projects,
    },
    Rule {
        description: "All partners must sign agreement",
        check: issue_all_partners_sign,
    },
];

/// Ordered rules for Update transitions.
pub const UPDATE_RULES: &[Rule] = &[
    Rule {
        description: "Must be one input",
        check: update_one_prior,
    },
    Rule {
        description: "Can add one project at a time",
        check: update_one_project_added,
    },
    Rule {
        description: "Project names must start with 'Project ...'",
        check: update_project_name_prefix,
    },
    Rule {
        description: "All partners must approve projects",
        check: update_all_partners_approve,
    },
];

/// The ordered rule list appropriate to a transition kind. The kind
/// enum is closed, so there is no unrecognized-kind failure path here;
/// a malformed handshake surfaces as [`AccordError::Protocol`]
/// elsewhere.
pub fn rules_for(kind: &TransitionKind) -> &'static [Rule] {
    match kind {
        TransitionKind::Issue { .. } => ISSUE_RULES,
        TransitionKind::Update => UPDATE_RULES,
    }
}

/// Validate a transition against the ordered rules for its kind.
/// Returns the first failing rule's description, or Ok if all pass.
///
/// Pure function of the transition content: no side effects, safe to
/// call repeatedly as both pre-check and final commit gate. Signature
/// completeness is deliberately not checked here (endorsements are
/// partial during the responder pre-check); the commit protocol
/// enforces it.
pub fn validate_transition(transition: &Transition) -> Result<(), AccordError> {
    for rule in rules_for(&transition.kind) {
        if !(rule.check)(transition) {
            return Err(AccordError::RuleViolation(rule.description.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use accord_types::agreement::Agreement;
    use accord_types::primitives::{PartyId, StateRef};
    use accord_types::transition::PriorState;

    use super::*;
    use proptest::prelude::*;

    const ALICE: PartyId = [1u8; 20];
    const BOB: PartyId = [2u8; 20];

    fn partners() -> BTreeSet<PartyId> {
        [ALICE, BOB].into_iter().collect()
    }

    fn issue_transition() -> Transition {
        let state = Agreement::new(partners());
        Transition {
            id: [0u8; 32],
            kind: TransitionKind::Issue { nonce: 1 },
            prior: None,
            new_state: state,
            required_signers: partners(),
            endorsements: BTreeMap::new(),
        }
    }

    fn update_transition(project: &str) -> Transition {
        let prior_state = Agreement::new(partners());
        let new_state = prior_state.with_project(project);
        Transition {
            id: [0u8; 32],
            kind: TransitionKind::Update,
            prior: Some(PriorState {
                state_ref: StateRef {
                    transition_id: [9u8; 32],
                },
                state: prior_state,
            }),
            new_state,
            required_signers: partners(),
            endorsements: BTreeMap::new(),
        }
    }

    #[test]
    fn test_valid_issue_passes() {
        assert!(validate_transition(&issue_transition()).is_ok());
    }

    #[test]
    fn test_issue_with_prior_rejected() {
        let mut transition = issue_transition();
        transition.prior = Some(PriorState {
            state_ref: StateRef {
                transition_id: [9u8; 32],
            },
            state: Agreement::new(partners()),
        });
        assert_eq!(
            validate_transition(&transition),
            Err(AccordError::RuleViolation("Must be no inputs".to_string()))
        );
    }

    #[test]
    fn test_issue_with_one_partner_rejected() {
        let mut transition = issue_transition();
        transition.new_state = Agreement::new([ALICE]);
        transition.required_signers = [ALICE].into_iter().collect();
        assert_eq!(
            validate_transition(&transition),
            Err(AccordError::RuleViolation(
                "Must be at least two partners".to_string()
            ))
        );
    }

    #[test]
    fn test_issue_with_projects_rejected() {
        let mut transition = issue_transition();
        transition.new_state = transition.new_state.with_project("Project X");
        assert_eq!(
            validate_transition(&transition),
            Err(AccordError::RuleViolation(
                "Must be no projects for a new agreement".to_string()
            ))
        );
    }

    #[test]
    fn test_issue_with_wrong_signers_rejected() {
        let mut transition = issue_transition();
        transition.required_signers = [ALICE].into_iter().collect();
        assert_eq!(
            validate_transition(&transition),
            Err(AccordError::RuleViolation(
                "All partners must sign agreement".to_string()
            ))
        );
    }

    #[test]
    fn test_valid_update_passes() {
        assert!(validate_transition(&update_transition("Project X")).is_ok());
    }

    #[test]
    fn test_update_without_prior_rejected() {
        let mut transition = update_transition("Project X");
        transition.prior = None;
        assert_eq!(
            validate_transition(&transition),
            Err(AccordError::RuleViolation("Must be one input".to_string()))
        );
    }

    #[test]
    fn test_update_adding_two_projects_rejected() {
        let mut transition = update_transition("Project X");
        transition.new_state = transition.new_state.with_project("Project Y");
        assert_eq!(
            validate_transition(&transition),
            Err(AccordError::RuleViolation(
                "Can add one project at a time".to_string()
            ))
        );
    }

    #[test]
    fn test_update_rewriting_history_rejected() {
        // Same length as prior + 1, but the existing project renamed.
        let mut transition = update_transition("Project X");
        let mut prior = transition.prior.clone().unwrap();
        prior.state = prior.state.with_project("Project Original");
        transition.prior = Some(prior.clone());
        transition.new_state = Agreement {
            partners: prior.state.partners.clone(),
            projects: vec!["Project Rewritten".to_string(), "Project X".to_string()],
        };
        assert_eq!(
            validate_transition(&transition),
            Err(AccordError::RuleViolation(
                "Can add one project at a time".to_string()
            ))
        );
    }

    #[test]
    fn test_update_bad_project_name_rejected() {
        assert_eq!(
            validate_transition(&update_transition("Widget")),
            Err(AccordError::RuleViolation(
                "Project names must start with 'Project ...'".to_string()
            ))
        );
    }

    #[test]
    fn test_update_with_wrong_signers_rejected() {
        let mut transition = update_transition("Project X");
        transition.required_signers = [ALICE].into_iter().collect();
        assert_eq!(
            validate_transition(&transition),
            Err(AccordError::RuleViolation(
                "All partners must approve projects".to_string()
            ))
        );
    }

    #[test]
    fn test_update_changing_partners_rejected() {
        let mut transition = update_transition("Project X");
        transition.new_state.partners.insert([3u8; 20]);
        assert_eq!(
            validate_transition(&transition),
            Err(AccordError::RuleViolation(
                "All partners must approve projects".to_string()
            ))
        );
    }

    proptest! {
        #[test]
        fn prop_validation_is_idempotent(name in "[a-zA-Z ]{0,30}") {
            let transition = update_transition(&name);
            let first = validate_transition(&transition);
            let second = validate_transition(&transition);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_update_accepts_iff_prefixed(name in "[a-zA-Z ]{0,30}") {
            let transition = update_transition(&name);
            let result = validate_transition(&transition);
            if name.starts_with("Project ") {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(result.is_err());
            }
        }
    }
}
