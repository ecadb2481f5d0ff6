use std::collections::BTreeSet;

use borsh::BorshDeserialize;

use accord_types::agreement::Agreement;
use accord_types::primitives::{PartyId, StateRef, TransitionId};
use accord_types::transition::CommittedRecord;

use crate::error::LedgerError;
use crate::traits::KvStore;

const STATE_PREFIX: &[u8] = b"vault:state:";
const CONSUMED_PREFIX: &[u8] = b"vault:consumed:";
const RECORD_PREFIX: &[u8] = b"vault:record:";

/// One party's view of the ledger: agreement states keyed by the
/// transition that produced them, consumption marks, and committed
/// records.
pub struct Vault<S: KvStore> {
    store: S,
}

impl<S: KvStore> Vault<S> {
    /// Create a new vault wrapping the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Build a key by concatenating a prefix with a transition id.
    fn make_key(prefix: &[u8], transition_id: &TransitionId) -> Vec<u8> {
        let mut key = Vec::with_capacity(prefix.len() + transition_id.len());
        key.extend_from_slice(prefix);
        key.extend_from_slice(transition_id);
        key
    }

    /// Save an agreement state under its producing transition.
    pub fn save_state(&self, state_ref: &StateRef, state: &Agreement) -> Result<(), LedgerError> {
        let key = Self::make_key(STATE_PREFIX, &state_ref.transition_id);
        let value = borsh::to_vec(state).map_err(|e| LedgerError::SerializationError {
            reason: e.to_string(),
        })?;
        self.store.put(&key, &value)
    }

    /// Load an agreement state, consumed or not.
    pub fn load_state(&self, state_ref: &StateRef) -> Result<Option<Agreement>, LedgerError> {
        let key = Self::make_key(STATE_PREFIX, &state_ref.transition_id);
        match self.store.get(&key)? {
            Some(bytes) => {
                let state = Agreement::try_from_slice(&bytes).map_err(|e| {
                    LedgerError::DeserializationError {
                        reason: e.to_string(),
                    }
                })?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Mark a state as consumed by the given transition. The state
    /// itself is retained as history.
    pub fn mark_consumed(
        &self,
        state_ref: &StateRef,
        consumed_by: TransitionId,
    ) -> Result<(), LedgerError> {
        let key = Self::make_key(CONSUMED_PREFIX, &state_ref.transition_id);
        self.store.put(&key, &consumed_by)
    }

    /// Whether a state has been consumed by a committed transition.
    pub fn is_consumed(&self, state_ref: &StateRef) -> Result<bool, LedgerError> {
        let key = Self::make_key(CONSUMED_PREFIX, &state_ref.transition_id);
        self.store.exists(&key)
    }

    /// Find the unconsumed agreement whose partner set equals exactly
    /// the given one. This is an exact-match lookup, not fuzzy.
    pub fn find_unconsumed_by_partners(
        &self,
        partners: &BTreeSet<PartyId>,
    ) -> Result<Option<(StateRef, Agreement)>, LedgerError> {
        for (key, value) in self.store.prefix_scan(STATE_PREFIX)? {
            let suffix = &key[STATE_PREFIX.len()..];
            let transition_id: TransitionId =
                suffix
                    .try_into()
                    .map_err(|_| LedgerError::DeserializationError {
                        reason: "malformed state key".to_string(),
                    })?;
            let state_ref = StateRef { transition_id };
            if self.is_consumed(&state_ref)? {
                continue;
            }
            let state = Agreement::try_from_slice(&value).map_err(|e| {
                LedgerError::DeserializationError {
                    reason: e.to_string(),
                }
            })?;
            if &state.partners == partners {
                return Ok(Some((state_ref, state)));
            }
        }
        Ok(None)
    }

    /// Save a committed record under its transition id.
    pub fn save_record(&self, record: &CommittedRecord) -> Result<(), LedgerError> {
        let key = Self::make_key(RECORD_PREFIX, &record.transition.id);
        let value = borsh::to_vec(record).map_err(|e| LedgerError::SerializationError {
            reason: e.to_string(),
        })?;
        self.store.put(&key, &value)
    }

    /// Load a committed record by transition id.
    pub fn load_record(
        &self,
        transition_id: &TransitionId,
    ) -> Result<Option<CommittedRecord>, LedgerError> {
        let key = Self::make_key(RECORD_PREFIX, transition_id);
        match self.store.get(&key)? {
            Some(bytes) => {
                let record = CommittedRecord::try_from_slice(&bytes).map_err(|e| {
                    LedgerError::DeserializationError {
                        reason: e.to_string(),
                    }
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Number of states held, consumed or not. Mostly for tests and
    /// diagnostics.
    pub fn state_count(&self) -> Result<usize, LedgerError> {
        Ok(self.store.prefix_scan(STATE_PREFIX)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn two_partners() -> BTreeSet<PartyId> {
        [[1u8; 20], [2u8; 20]].into_iter().collect()
    }

    fn make_vault() -> Vault<MemoryStore> {
        Vault::new(MemoryStore::new())
    }

    #[test]
    fn test_save_and_load_state() {
        let vault = make_vault();
        let state = Agreement::new(two_partners());
        let state_ref = StateRef {
            transition_id: [1u8; 32],
        };
        vault.save_state(&state_ref, &state).unwrap();
        assert_eq!(vault.load_state(&state_ref).unwrap(), Some(state));
    }

    #[test]
    fn test_missing_rows_load_as_none() {
        let vault = make_vault();
        let state_ref = StateRef {
            transition_id: [1u8; 32],
        };
        assert_eq!(vault.load_state(&state_ref).unwrap(), None);
        assert_eq!(vault.load_record(&[1u8; 32]).unwrap(), None);
        assert!(!vault.is_consumed(&state_ref).unwrap());
    }

    #[test]
    fn test_find_unconsumed_exact_match() {
        let vault = make_vault();
        let state = Agreement::new(two_partners());
        let state_ref = StateRef {
            transition_id: [1u8; 32],
        };
        vault.save_state(&state_ref, &state).unwrap();

        let found = vault.find_unconsumed_by_partners(&two_partners()).unwrap();
        assert_eq!(found, Some((state_ref, state)));

        // A different partner set finds nothing.
        let other: BTreeSet<PartyId> = [[1u8; 20], [3u8; 20]].into_iter().collect();
        assert_eq!(vault.find_unconsumed_by_partners(&other).unwrap(), None);
    }

    #[test]
    fn test_consumed_state_skipped_but_loadable() {
        let vault = make_vault();
        let state = Agreement::new(two_partners());
        let state_ref = StateRef {
            transition_id: [1u8; 32],
        };
        vault.save_state(&state_ref, &state).unwrap();
        vault.mark_consumed(&state_ref, [2u8; 32]).unwrap();

        assert!(vault.is_consumed(&state_ref).unwrap());
        assert_eq!(vault.find_unconsumed_by_partners(&two_partners()).unwrap(), None);
        // History is retained.
        assert_eq!(vault.load_state(&state_ref).unwrap(), Some(state));
    }

    #[test]
    fn test_successor_found_after_predecessor_consumed() {
        let vault = make_vault();
        let old = Agreement::new(two_partners());
        let old_ref = StateRef {
            transition_id: [1u8; 32],
        };
        let new = old.with_project("Project X");
        let new_ref = StateRef {
            transition_id: [2u8; 32],
        };
        vault.save_state(&old_ref, &old).unwrap();
        vault.save_state(&new_ref, &new).unwrap();
        vault.mark_consumed(&old_ref, new_ref.transition_id).unwrap();

        let found = vault.find_unconsumed_by_partners(&two_partners()).unwrap();
        assert_eq!(found, Some((new_ref, new)));
    }
}
