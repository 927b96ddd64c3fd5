//! In-process record store.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::audit::{AuditDraft, AuditEntry};
use crate::document::{DocumentId, DocumentRecord};
use crate::error::{KycError, Result};
use crate::identity::UserId;
use crate::profile::{StatusChange, VerificationProfile, VerificationStatus};
use crate::review::ReviewTransition;

use super::RecordStore;

#[derive(Default)]
struct State {
    documents: HashMap<DocumentId, DocumentRecord>,
    profiles: HashMap<UserId, VerificationProfile>,
    audit: Vec<AuditEntry>,
}

impl State {
    fn seal(&mut self, draft: AuditDraft) -> AuditEntry {
        let previous = self.audit.last();
        let sequence = previous.map(|e| e.sequence + 1).unwrap_or(1);
        let previous_hash = previous.map(|e| e.entry_hash.clone());
        let entry = AuditEntry::seal(draft, sequence, previous_hash);
        self.audit.push(entry.clone());
        entry
    }
}

/// `RecordStore` held entirely in memory behind one `RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| KycError::StorageError("record store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| KycError::StorageError("record store lock poisoned".into()))
    }
}

impl RecordStore for MemoryStore {
    fn insert_document(&self, record: &DocumentRecord) -> Result<()> {
        let mut state = self.write()?;
        if state.documents.contains_key(&record.id) {
            return Err(KycError::StorageError(format!(
                "document already exists: {}",
                record.id
            )));
        }
        state.documents.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn get_document(&self, id: &DocumentId) -> Result<Option<DocumentRecord>> {
        Ok(self.read()?.documents.get(id).cloned())
    }

    fn documents_for_user(&self, user_id: &UserId) -> Result<Vec<DocumentRecord>> {
        Ok(self
            .read()?
            .documents
            .values()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect())
    }

    fn all_documents(&self) -> Result<Vec<DocumentRecord>> {
        Ok(self.read()?.documents.values().cloned().collect())
    }

    fn delete_document(&self, id: &DocumentId) -> Result<Option<DocumentRecord>> {
        Ok(self.write()?.documents.remove(id))
    }

    fn commit_review(&self, transition: &ReviewTransition) -> Result<(DocumentRecord, AuditEntry)> {
        let mut state = self.write()?;

        let record = state
            .documents
            .get_mut(&transition.document_id)
            .ok_or_else(|| {
                KycError::NotFound(format!("document not found: {}", transition.document_id))
            })?;
        let reviewed_at = crate::time::now_micros();
        transition.apply(record, reviewed_at)?;
        let record = record.clone();

        let entry = state.seal(transition.audit_draft(&record, reviewed_at));
        Ok((record, entry))
    }

    fn append_audit(&self, draft: AuditDraft) -> Result<AuditEntry> {
        Ok(self.write()?.seal(draft))
    }

    fn audit_entries(&self) -> Result<Vec<AuditEntry>> {
        Ok(self.read()?.audit.clone())
    }

    fn load_profile(&self, user_id: &UserId) -> Result<Option<VerificationProfile>> {
        Ok(self.read()?.profiles.get(user_id).cloned())
    }

    fn refresh_profile(
        &self,
        user_id: &UserId,
        derive: &dyn Fn(&[DocumentRecord]) -> VerificationStatus,
    ) -> Result<StatusChange> {
        let mut state = self.write()?;

        let records: Vec<DocumentRecord> = state
            .documents
            .values()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        let current = derive(&records);

        let existing = state.profiles.get(user_id);
        let previous = existing
            .map(|p| p.verification_status)
            .unwrap_or(VerificationStatus::Unverified);

        if existing.is_none() || previous != current {
            state.profiles.insert(
                user_id.clone(),
                VerificationProfile {
                    user_id: user_id.clone(),
                    verification_status: current,
                    updated_at: crate::time::now_micros(),
                },
            );
        }

        Ok(StatusChange {
            user_id: user_id.clone(),
            previous,
            current,
        })
    }
}
