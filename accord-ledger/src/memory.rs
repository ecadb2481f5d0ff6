use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::traits::{KvPairs, KvStore};

/// In-memory key-value store backed by a BTreeMap.
/// Uses BTreeMap so that prefix_scan can leverage ordered iteration.
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        let data = self.data.read().map_err(|e| LedgerError::ReadError {
            reason: e.to_string(),
        })?;
        Ok(data.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(|e| LedgerError::WriteError {
            reason: e.to_string(),
        })?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(|e| LedgerError::WriteError {
            reason: e.to_string(),
        })?;
        data.remove(key);
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, LedgerError> {
        let data = self.data.read().map_err(|e| LedgerError::ReadError {
            reason: e.to_string(),
        })?;
        Ok(data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<KvPairs, LedgerError> {
        let data = self.data.read().map_err(|e| LedgerError::ReadError {
            reason: e.to_string(),
        })?;
        Ok(data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
