use std::collections::BTreeSet;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::primitives::PartyId;

/// The ledger-resident state of a partnership: the fixed set of
/// partners and the append-only list of collaborative projects.
///
/// Instances are immutable. An Update transition derives a successor
/// with [`Agreement::with_project`]; superseded instances remain in
/// the vault as history.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Agreement {
    /// The partners bound by this agreement. Fixed after issuance.
    pub partners: BTreeSet<PartyId>,
    /// Project names, in the order they were agreed. Grows by exactly
    /// one per accepted Update.
    pub projects: Vec<String>,
}

impl Agreement {
    /// Create a fresh agreement between the given partners, with no
    /// projects yet.
    pub fn new(partners: impl IntoIterator<Item = PartyId>) -> Self {
        Self {
            partners: partners.into_iter().collect(),
            projects: Vec::new(),
        }
    }

    /// Derive the successor state with one more project appended.
    pub fn with_project(&self, name: impl Into<String>) -> Self {
        let mut projects = self.projects.clone();
        projects.push(name.into());
        Self {
            partners: self.partners.clone(),
            projects,
        }
    }

    /// The parties that participate in this agreement.
    pub fn participants(&self) -> impl Iterator<Item = &PartyId> {
        self.partners.iter()
    }
}
