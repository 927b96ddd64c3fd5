//! Error types for KYC review.
//!
//! Every error is returned to the immediate caller. The only failures that
//! are swallowed are status-observer notifications, which are logged.

use crate::document::DocumentStatus;

/// KYC error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum KycError {
    /// Malformed input. No state was changed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Attempted transition on a record that is no longer `pending`.
    ///
    /// Callers must re-fetch the record before acting again.
    #[error("Document {document_id} is already {current}")]
    Conflict {
        document_id: String,
        current: DocumentStatus,
    },

    /// A collaborator (blob store, record persistence) was unavailable.
    #[error("Dependency unavailable: {0}")]
    Dependency(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User {0} is not verified")]
    NotVerified(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Audit chain broken at sequence {sequence}")]
    InvalidAuditChain { sequence: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KycError {
    /// True for errors that a caller may resolve by retrying the same call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Dependency(_) | Self::Io(_))
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, KycError>;
