//! Review engine — validated, race-safe decisions on single documents.

use std::sync::Arc;

use crate::document::DocumentId;
use crate::error::Result;
use crate::identity::ReviewerId;
use crate::profile::StatusAggregator;
use crate::storage::RecordStore;

use super::types::{Decision, ReviewOutcome, ReviewTransition};

/// Applies administrator decisions.
///
/// The critical section is the single `commit_review` call on the store;
/// no lock is held across validation or the status recompute.
#[derive(Clone)]
pub struct ReviewEngine {
    store: Arc<dyn RecordStore>,
    aggregator: StatusAggregator,
}

impl ReviewEngine {
    pub fn new(store: Arc<dyn RecordStore>, aggregator: StatusAggregator) -> Self {
        Self { store, aggregator }
    }

    /// Decide on one pending document.
    ///
    /// On success the record's review fields and one audit entry are
    /// persisted together, then the owner's verification status is
    /// recomputed.
    ///
    /// # Errors
    ///
    /// - `KycError::Validation` if rejecting without notes; nothing is written.
    /// - `KycError::NotFound` for an unknown document.
    /// - `KycError::Conflict` if the document was already decided. The
    ///   caller must re-fetch it and must not retry the same decision.
    /// - Any store error from the recompute. The decision itself is
    ///   durable at that point and a later recompute repairs the status.
    pub fn decide(
        &self,
        document_id: &DocumentId,
        reviewer_id: &ReviewerId,
        decision: Decision,
        notes: Option<&str>,
    ) -> Result<ReviewOutcome> {
        let transition =
            ReviewTransition::new(document_id.clone(), reviewer_id.clone(), decision, notes)?;

        let (document, entry) = match self.store.commit_review(&transition) {
            Ok(committed) => committed,
            Err(e) => {
                log::info!("decision {decision} on {document_id} by {reviewer_id} refused: {e}");
                return Err(e);
            }
        };
        log::info!(
            "document {} {} by {} (audit {})",
            document.id,
            document.status,
            reviewer_id,
            entry.id
        );

        let verification_status = self.aggregator.recompute(&document.user_id)?;

        Ok(ReviewOutcome {
            document,
            audit_id: entry.id,
            verification_status,
        })
    }
}
