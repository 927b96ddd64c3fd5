//! Read and append access to the audit log.

use std::sync::Arc;

use crate::document::DocumentId;
use crate::error::Result;
use crate::identity::UserId;
use crate::storage::RecordStore;

use super::chain::verify_audit_chain;
use super::entry::{AuditDraft, AuditEntry, AuditId};

/// Append-only audit log over a `RecordStore`.
///
/// There is no update or delete. Review decisions append through
/// `RecordStore::commit_review` so the entry and the transition land
/// together; `append` is the entry point for any other review write path.
#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn RecordStore>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Append an entry at the end of the log.
    pub fn append(&self, draft: AuditDraft) -> Result<AuditId> {
        let entry = self.store.append_audit(draft)?;
        log::debug!("audit entry {} appended at {}", entry.id, entry.sequence);
        Ok(entry.id)
    }

    /// Entries about any document of `user_id`, oldest first.
    pub fn list_by_user(&self, user_id: &UserId) -> Result<AuditEntries> {
        self.scoped(Scope::User(user_id.clone()))
    }

    /// Entries about `document_id`, oldest first. Works after the document
    /// itself has been purged.
    pub fn list_by_document(&self, document_id: &DocumentId) -> Result<AuditEntries> {
        self.scoped(Scope::Document(document_id.clone()))
    }

    /// The whole log, oldest first.
    pub fn entries(&self) -> Result<AuditEntries> {
        self.scoped(Scope::All)
    }

    /// Verify the hash chain of the whole log. Returns the number of entries.
    pub fn verify(&self) -> Result<usize> {
        let entries = self.store.audit_entries()?;
        verify_audit_chain(&entries)?;
        Ok(entries.len())
    }

    fn scoped(&self, scope: Scope) -> Result<AuditEntries> {
        Ok(AuditEntries {
            entries: self.store.audit_entries()?.into_iter(),
            scope,
        })
    }
}

enum Scope {
    All,
    User(UserId),
    Document(DocumentId),
}

impl Scope {
    fn includes(&self, entry: &AuditEntry) -> bool {
        match self {
            Self::All => true,
            Self::User(user_id) => &entry.user_id == user_id,
            Self::Document(document_id) => &entry.document_id == document_id,
        }
    }
}

/// Finite, time-ordered iterator over a snapshot of the audit log.
pub struct AuditEntries {
    entries: std::vec::IntoIter<AuditEntry>,
    scope: Scope,
}

impl Iterator for AuditEntries {
    type Item = AuditEntry;

    fn next(&mut self) -> Option<AuditEntry> {
        let scope = &self.scope;
        self.entries.by_ref().find(|e| scope.includes(e))
    }
}
