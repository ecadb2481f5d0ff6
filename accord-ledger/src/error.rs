use thiserror::Error;

use accord_types::error::AccordError;

/// Errors that can occur during vault operations. A missing row is
/// not an error; lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("read error: {reason}")]
    ReadError { reason: String },

    #[error("write error: {reason}")]
    WriteError { reason: String },

    #[error("serialization error: {reason}")]
    SerializationError { reason: String },

    #[error("deserialization error: {reason}")]
    DeserializationError { reason: String },
}

impl From<LedgerError> for AccordError {
    fn from(err: LedgerError) -> Self {
        AccordError::Ledger {
            reason: err.to_string(),
        }
    }
}
