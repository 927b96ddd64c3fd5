//! Document Registry — identity-document records and their lifecycle.
//!
//! The document module provides:
//! - Document records with per-document review status
//! - Submission of new records once their blob is durably stored
//! - Point-in-time listing by user (newest first)
//! - Admin listing with status filter and search
//! - Data-retention purge

pub mod registry;
pub mod types;

pub use registry::DocumentRegistry;
pub use types::{
    DocumentFilter, DocumentId, DocumentRecord, DocumentStatus, DocumentType, FileDescriptor,
    FileMetadata, StatusCounts,
};
