use std::sync::Arc;

use crate::error::LedgerError;

/// Result type for prefix scan operations: a list of key-value byte pairs.
pub type KvPairs = Vec<(Vec<u8>, Vec<u8>)>;

/// Core key-value store trait backing a vault.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError>;
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), LedgerError>;
    fn delete(&self, key: &[u8]) -> Result<(), LedgerError>;
    fn exists(&self, key: &[u8]) -> Result<bool, LedgerError>;
    fn prefix_scan(&self, prefix: &[u8]) -> Result<KvPairs, LedgerError>;
}

/// Blanket implementation of KvStore for `Arc<S>` so that a store can
/// be shared across multiple owners.
impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), LedgerError> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), LedgerError> {
        (**self).delete(key)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, LedgerError> {
        (**self).exists(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<KvPairs, LedgerError> {
        (**self).prefix_scan(prefix)
    }
}

/// Blanket implementation of KvStore for `Box<dyn KvStore>` so that a
/// type-erased store can be used wherever a concrete store is expected.
impl KvStore for Box<dyn KvStore> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        (**self).get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), LedgerError> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), LedgerError> {
        (**self).delete(key)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, LedgerError> {
        (**self).exists(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<KvPairs, LedgerError> {
        (**self).prefix_scan(prefix)
    }
}
