//! Document registry — creation, lookup, listing and purge of records.

use std::sync::Arc;

use crate::blob::StorageRef;
use crate::error::{KycError, Result};
use crate::identity::UserId;
use crate::storage::RecordStore;

use super::types::{
    sort_newest_first, DocumentFilter, DocumentId, DocumentRecord, DocumentStatus, DocumentType,
    FileDescriptor, FileMetadata, StatusCounts,
};

/// Owner of document records.
///
/// The registry creates records and removes them for data retention. It
/// never changes a record's `status`; that is the review engine's
/// compare-and-swap.
#[derive(Clone)]
pub struct DocumentRegistry {
    store: Arc<dyn RecordStore>,
}

impl DocumentRegistry {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Create a `pending` record for a blob that is already durably stored.
    ///
    /// # Errors
    ///
    /// `KycError::Validation` for missing user id, file name or storage
    /// reference, or a zero-length file. `KycError::Dependency` if the
    /// record could not be persisted; the blob is left in place and the
    /// caller decides whether to retry or clean it up.
    pub fn submit(
        &self,
        user_id: &UserId,
        document_type: DocumentType,
        file: FileDescriptor,
        storage_ref: StorageRef,
    ) -> Result<DocumentId> {
        if user_id.0.trim().is_empty() {
            return Err(KycError::Validation("user id is required".into()));
        }
        if file.name.trim().is_empty() {
            return Err(KycError::Validation("file name is required".into()));
        }
        if file.size == 0 {
            return Err(KycError::Validation(format!(
                "file {} is empty",
                file.name
            )));
        }
        if storage_ref.0.is_empty() {
            return Err(KycError::Validation("storage reference is required".into()));
        }

        let record = DocumentRecord {
            id: DocumentId::generate(user_id, document_type),
            user_id: user_id.clone(),
            document_type,
            file: FileMetadata {
                name: file.name,
                mime_type: file.mime_type,
                size: file.size,
                storage_ref,
            },
            status: DocumentStatus::Pending,
            reviewer_id: None,
            reviewed_at: None,
            review_notes: None,
            created_at: crate::time::now_micros(),
        };

        self.store.insert_document(&record).map_err(|e| {
            KycError::Dependency(format!(
                "failed to record {} for {}: {e}",
                record.file.name, record.user_id
            ))
        })?;

        log::info!(
            "document {} ({}) submitted by {}",
            record.id,
            record.document_type,
            record.user_id
        );
        Ok(record.id)
    }

    /// Look up one record.
    pub fn get(&self, id: &DocumentId) -> Result<DocumentRecord> {
        self.store
            .get_document(id)?
            .ok_or_else(|| KycError::NotFound(format!("document not found: {id}")))
    }

    /// Point-in-time snapshot of a user's records, newest first.
    pub fn list_by_user(&self, user_id: &UserId) -> Result<Vec<DocumentRecord>> {
        let mut records = self.store.documents_for_user(user_id)?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Records across all users matching `filter`, newest first.
    pub fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>> {
        let mut records = match &filter.user_id {
            Some(user_id) => self.store.documents_for_user(user_id)?,
            None => self.store.all_documents()?,
        };
        records.retain(|r| filter.matches(r));
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Record counts per review status across all users.
    pub fn counts(&self) -> Result<StatusCounts> {
        Ok(StatusCounts::tally(&self.store.all_documents()?))
    }

    /// Remove a record for data retention and return it.
    ///
    /// Audit entries that reference the record are kept.
    pub fn purge(&self, id: &DocumentId) -> Result<DocumentRecord> {
        let removed = self
            .store
            .delete_document(id)?
            .ok_or_else(|| KycError::NotFound(format!("document not found: {id}")))?;
        log::info!("document {} of {} purged", removed.id, removed.user_id);
        Ok(removed)
    }
}
