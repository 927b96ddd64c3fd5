//! Storage layer for document records, verification profiles and the
//! audit log.
//!
//! Both backends implement [`RecordStore`]. The trait's mutating methods
//! are the only write paths for document `status`, profile
//! `verification_status` and the audit log, and each runs as a single
//! critical section inside the backend.
//!
//! # Directory layout
//!
//! The file backend lays its records out as:
//!
//! ```text
//! {base_dir}/
//! ├── documents/
//! │   └── {document_id}.json
//! ├── profiles/
//! │   └── {hex(user_id)}.json
//! └── audit/
//!     └── {sequence:020}_{audit_id}.json
//! ```
//!
//! # Modules
//!
//! - [`file_store`] — versioned JSON files, one per record.
//! - [`memory`] — in-process maps behind a `RwLock`.

pub mod file_store;
pub mod memory;

use crate::audit::{AuditDraft, AuditEntry};
use crate::document::{DocumentId, DocumentRecord};
use crate::error::Result;
use crate::identity::UserId;
use crate::profile::{StatusChange, VerificationProfile, VerificationStatus};
use crate::review::ReviewTransition;

pub use file_store::FileStore;
pub use memory::MemoryStore;

/// Persistence for everything the core owns.
pub trait RecordStore: Send + Sync {
    /// Persist a newly created record. Fails if the id already exists.
    fn insert_document(&self, record: &DocumentRecord) -> Result<()>;

    fn get_document(&self, id: &DocumentId) -> Result<Option<DocumentRecord>>;

    /// All records owned by `user_id`, in no particular order.
    fn documents_for_user(&self, user_id: &UserId) -> Result<Vec<DocumentRecord>>;

    /// Every record in the store, in no particular order.
    fn all_documents(&self) -> Result<Vec<DocumentRecord>>;

    /// Remove a record for data retention. Returns the removed record.
    fn delete_document(&self, id: &DocumentId) -> Result<Option<DocumentRecord>>;

    /// Compare-and-swap the record out of `pending` and append its audit
    /// entry, as one unit.
    ///
    /// Either both the transition and the audit entry are persisted, or
    /// neither is. Returns `KycError::Conflict` if the record is no longer
    /// pending and `KycError::NotFound` if it does not exist.
    fn commit_review(&self, transition: &ReviewTransition) -> Result<(DocumentRecord, AuditEntry)>;

    /// Append an audit entry at the end of the log.
    fn append_audit(&self, draft: AuditDraft) -> Result<AuditEntry>;

    /// The full audit log ordered by sequence.
    fn audit_entries(&self) -> Result<Vec<AuditEntry>>;

    fn load_profile(&self, user_id: &UserId) -> Result<Option<VerificationProfile>>;

    /// Re-derive and persist a user's status from their current records.
    ///
    /// The read of the records and the write of the profile happen in one
    /// critical section, so concurrent refreshes never persist a stale
    /// derivation. The profile is only rewritten when the status changes or
    /// no profile exists yet.
    fn refresh_profile(
        &self,
        user_id: &UserId,
        derive: &dyn Fn(&[DocumentRecord]) -> VerificationStatus,
    ) -> Result<StatusChange>;
}
