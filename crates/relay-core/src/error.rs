//! Error types for relay operations.

use std::io;
use thiserror::Error;

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors surfaced by the registry, message store and chat service.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RelayError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Participant already registered: {0}")]
    Conflict(String),

    #[error("Participant not found: {0}")]
    NotFound(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl From<io::Error> for RelayError {
    fn from(err: io::Error) -> Self {
        RelayError::StorageFailure(err.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::StorageFailure(err.to_string())
    }
}

impl RelayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        RelayError::Validation(msg.into())
    }

    /// Check if this error came from the storage collaborator.
    #[inline]
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, RelayError::StorageFailure(_))
    }
}
