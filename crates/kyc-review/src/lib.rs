//! KycReview — identity document intake and review.
//!
//! Users submit identity documents, administrators approve or reject them
//! one at a time, and each user's verification status is re-derived from
//! their documents after every transition. Every decision leaves an
//! append-only, hash-chained audit entry.

pub mod audit;
pub mod blob;
pub mod config;
pub mod document;
pub mod error;
pub mod identity;
pub mod notify;
pub mod profile;
pub mod review;
pub mod service;
pub mod storage;
pub mod time;

// Re-export primary types
pub use config::KycConfig;
pub use error::{KycError, Result};
pub use identity::{ReviewerId, UserId};
pub use service::{KycService, SubmissionItem, SubmissionReport, Upload};

// Re-export document types
pub use document::{
    DocumentFilter, DocumentId, DocumentRecord, DocumentRegistry, DocumentStatus, DocumentType,
    FileDescriptor, FileMetadata, StatusCounts,
};

// Re-export review and status types
pub use profile::{
    aggregate, ResubmissionPolicy, StatusAggregator, StatusChange, VerificationProfile,
    VerificationStatus,
};
pub use review::{Decision, ReviewEngine, ReviewOutcome, ReviewTransition};

// Re-export audit and storage types
pub use audit::{verify_audit_chain, AuditDraft, AuditEntry, AuditId, AuditLog};
pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore, StorageRef};
pub use notify::{LogObserver, StatusObserver};
pub use storage::{FileStore, MemoryStore, RecordStore};
