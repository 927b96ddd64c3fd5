//! KYC service — submission and review handlers wired to their
//! collaborators.
//!
//! Submission always writes the blob first and creates the record second,
//! so a record is never visible for a blob that is not stored. After a
//! timeout the caller can call [`KycService::documents`]: no record means
//! the whole submission is safe to retry, a `pending` record means the
//! document arrived and should be reviewed rather than resubmitted.

use std::sync::Arc;

use crate::audit::AuditLog;
use crate::blob::{blob_path, BlobStore};
use crate::config::KycConfig;
use crate::document::{
    DocumentFilter, DocumentId, DocumentRecord, DocumentRegistry, DocumentType, FileDescriptor,
    StatusCounts,
};
use crate::error::{KycError, Result};
use crate::identity::{ReviewerId, UserId};
use crate::notify::StatusObserver;
use crate::profile::{StatusAggregator, VerificationProfile, VerificationStatus};
use crate::review::{Decision, ReviewEngine, ReviewOutcome};
use crate::storage::RecordStore;

// ---------------------------------------------------------------------------
// Upload and submission report
// ---------------------------------------------------------------------------

/// One file handed in by a user.
#[derive(Debug, Clone)]
pub struct Upload {
    pub document_type: DocumentType,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(
        document_type: DocumentType,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            document_type,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    fn descriptor(&self) -> FileDescriptor {
        FileDescriptor::new(
            self.file_name.clone(),
            self.mime_type.clone(),
            self.bytes.len() as u64,
        )
    }
}

/// Outcome of one file within a multi-document submission.
#[derive(Debug)]
pub struct SubmissionItem {
    pub file_name: String,
    pub result: Result<DocumentId>,
}

/// Partial-success outcome of a multi-document submission.
#[derive(Debug)]
pub struct SubmissionReport {
    pub items: Vec<SubmissionItem>,
    /// Status after the batch, recomputed once at the end. An error here
    /// does not undo the accepted items: they are stored and the next
    /// recompute repairs the status.
    pub verification_status: Result<VerificationStatus>,
}

impl SubmissionReport {
    pub fn accepted(&self) -> Vec<&DocumentId> {
        self.items
            .iter()
            .filter_map(|item| item.result.as_ref().ok())
            .collect()
    }

    pub fn failures(&self) -> Vec<(&str, &KycError)> {
        self.items
            .iter()
            .filter_map(|item| match &item.result {
                Err(e) => Some((item.file_name.as_str(), e)),
                Ok(_) => None,
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|item| item.result.is_ok())
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Entry point for submission and review workers.
///
/// Cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct KycService {
    config: KycConfig,
    blobs: Arc<dyn BlobStore>,
    registry: DocumentRegistry,
    aggregator: StatusAggregator,
    engine: ReviewEngine,
    audit: AuditLog,
    store: Arc<dyn RecordStore>,
}

impl KycService {
    pub fn new(config: KycConfig, store: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        let aggregator = StatusAggregator::new(store.clone(), config.resubmission_policy);
        Self {
            registry: DocumentRegistry::new(store.clone()),
            engine: ReviewEngine::new(store.clone(), aggregator.clone()),
            audit: AuditLog::new(store.clone()),
            aggregator,
            config,
            blobs,
            store,
        }
    }

    /// Register an observer for verification status changes.
    pub fn with_observer(mut self, observer: Arc<dyn StatusObserver>) -> Self {
        self.aggregator = self.aggregator.with_observer(observer);
        self.engine = ReviewEngine::new(self.store.clone(), self.aggregator.clone());
        self
    }

    pub fn config(&self) -> &KycConfig {
        &self.config
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    // ── Submission ────────────────────────────────────────────────────────────

    /// Submit one document and recompute the user's status.
    ///
    /// Once the record is stored the id is returned even if the recompute
    /// fails; that failure is logged and repaired by the next recompute.
    pub fn submit(&self, user_id: &UserId, upload: Upload) -> Result<DocumentId> {
        let id = self.store_upload(user_id, &upload)?;
        if let Err(e) = self.aggregator.recompute(user_id) {
            log::warn!("status of {user_id} not recomputed after submitting {id}: {e}");
        }
        Ok(id)
    }

    /// Submit several documents.
    ///
    /// Each file is handled independently: a failure is reported for that
    /// file and the remaining files are still processed. Documents already
    /// stored are never rolled back because a sibling failed.
    ///
    /// # Errors
    ///
    /// `KycError::Validation` if `uploads` is empty. Per-file errors are in
    /// the report.
    pub fn submit_batch(&self, user_id: &UserId, uploads: Vec<Upload>) -> Result<SubmissionReport> {
        if uploads.is_empty() {
            return Err(KycError::Validation(
                "at least one identity document is required".into(),
            ));
        }

        let items: Vec<SubmissionItem> = uploads
            .into_iter()
            .map(|upload| {
                let result = self.store_upload(user_id, &upload);
                if let Err(e) = &result {
                    log::warn!("upload {} for {} failed: {e}", upload.file_name, user_id);
                }
                SubmissionItem {
                    file_name: upload.file_name,
                    result,
                }
            })
            .collect();

        let verification_status = self.aggregator.recompute(user_id);
        if let Err(e) = &verification_status {
            log::warn!("status of {user_id} not recomputed after batch: {e}");
        }
        Ok(SubmissionReport {
            items,
            verification_status,
        })
    }

    /// Validate, write the blob, then create the record.
    fn store_upload(&self, user_id: &UserId, upload: &Upload) -> Result<DocumentId> {
        if user_id.0.trim().is_empty() {
            return Err(KycError::Validation("user id is required".into()));
        }
        if upload.file_name.trim().is_empty() {
            return Err(KycError::Validation("file name is required".into()));
        }
        let descriptor = upload.descriptor();
        self.config.check_upload(&descriptor)?;

        let path = blob_path(user_id, upload.document_type, &upload.file_name);
        let storage_ref = self.blobs.put(&path, &upload.bytes)?;

        match self
            .registry
            .submit(user_id, upload.document_type, descriptor, storage_ref.clone())
        {
            Ok(id) => Ok(id),
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&storage_ref) {
                    log::warn!("orphaned blob {storage_ref} left behind: {cleanup}");
                }
                Err(e)
            }
        }
    }

    // ── Review ────────────────────────────────────────────────────────────────

    pub fn decide(
        &self,
        document_id: &DocumentId,
        reviewer_id: &ReviewerId,
        decision: Decision,
        notes: Option<&str>,
    ) -> Result<ReviewOutcome> {
        self.engine.decide(document_id, reviewer_id, decision, notes)
    }

    pub fn approve(
        &self,
        document_id: &DocumentId,
        reviewer_id: &ReviewerId,
        notes: Option<&str>,
    ) -> Result<ReviewOutcome> {
        self.decide(document_id, reviewer_id, Decision::Approve, notes)
    }

    pub fn reject(
        &self,
        document_id: &DocumentId,
        reviewer_id: &ReviewerId,
        notes: &str,
    ) -> Result<ReviewOutcome> {
        self.decide(document_id, reviewer_id, Decision::Reject, Some(notes))
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// A user's documents, newest first.
    pub fn documents(&self, user_id: &UserId) -> Result<Vec<DocumentRecord>> {
        self.registry.list_by_user(user_id)
    }

    pub fn document(&self, document_id: &DocumentId) -> Result<DocumentRecord> {
        self.registry.get(document_id)
    }

    /// Documents across all users matching `filter`, newest first.
    pub fn review_queue(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>> {
        self.registry.list(filter)
    }

    pub fn counts(&self) -> Result<StatusCounts> {
        self.registry.counts()
    }

    /// Fetch a document record together with its file bytes.
    pub fn download(&self, document_id: &DocumentId) -> Result<(DocumentRecord, Vec<u8>)> {
        let record = self.registry.get(document_id)?;
        let bytes = self.blobs.get(&record.file.storage_ref)?;
        Ok((record, bytes))
    }

    pub fn profile(&self, user_id: &UserId) -> Result<VerificationProfile> {
        self.aggregator.profile(user_id)
    }

    /// Re-derive a user's status from their current records.
    pub fn recompute(&self, user_id: &UserId) -> Result<VerificationStatus> {
        self.aggregator.recompute(user_id)
    }

    /// Gate for features that need a verified identity.
    ///
    /// # Errors
    ///
    /// `KycError::NotVerified` unless the stored status is `verified`.
    pub fn require_verified(&self, user_id: &UserId) -> Result<()> {
        match self.profile(user_id)?.verification_status {
            VerificationStatus::Verified => Ok(()),
            _ => Err(KycError::NotVerified(user_id.0.clone())),
        }
    }

    // ── Data retention ────────────────────────────────────────────────────────

    /// Delete a document and its file, then recompute the owner's status.
    ///
    /// The blob goes first: if it cannot be deleted the record is kept and
    /// the call can be retried. Audit entries for the document are kept.
    pub fn purge(&self, document_id: &DocumentId) -> Result<DocumentRecord> {
        let record = self.registry.get(document_id)?;
        self.blobs.delete(&record.file.storage_ref)?;
        let removed = self.registry.purge(document_id)?;
        self.aggregator.recompute(&removed.user_id)?;
        Ok(removed)
    }
}
