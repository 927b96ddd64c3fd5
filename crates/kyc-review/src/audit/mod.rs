//! Audit Log — append-only record of every review action.
//!
//! The audit module provides:
//! - Audit entries with weak references to the document and user
//! - A SHA-256 hash chain linking each entry to its predecessor
//! - Time-ordered listing by user and by document
//! - Whole-log chain verification

pub mod audit_log;
pub mod chain;
pub mod entry;

pub use audit_log::{AuditEntries, AuditLog};
pub use chain::verify_audit_chain;
pub use entry::{AuditDraft, AuditEntry, AuditId};
