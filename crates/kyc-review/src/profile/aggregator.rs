//! Status aggregator — recomputes and persists a user's verification
//! status after every document transition.

use std::sync::Arc;

use crate::document::DocumentRecord;
use crate::error::Result;
use crate::identity::UserId;
use crate::notify::{notify_all, StatusObserver};
use crate::storage::RecordStore;

use super::policy::ResubmissionPolicy;
use super::status::{aggregate, VerificationProfile, VerificationStatus};

/// Sole writer of `verification_status`.
///
/// `recompute` always re-derives from persisted records, never from an
/// in-memory delta, so the last recompute to run reflects every transition
/// that completed before it.
#[derive(Clone)]
pub struct StatusAggregator {
    store: Arc<dyn RecordStore>,
    policy: ResubmissionPolicy,
    observers: Vec<Arc<dyn StatusObserver>>,
}

impl StatusAggregator {
    pub fn new(store: Arc<dyn RecordStore>, policy: ResubmissionPolicy) -> Self {
        Self {
            store,
            policy,
            observers: Vec::new(),
        }
    }

    /// Register an observer for status changes.
    pub fn with_observer(mut self, observer: Arc<dyn StatusObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn policy(&self) -> ResubmissionPolicy {
        self.policy
    }

    /// Recompute and persist the status of `user_id`.
    ///
    /// Idempotent: running it again without an intervening transition
    /// returns the same status and writes nothing.
    pub fn recompute(&self, user_id: &UserId) -> Result<VerificationStatus> {
        let policy = self.policy;
        let change = self
            .store
            .refresh_profile(user_id, &|records: &[DocumentRecord]| {
                aggregate(records, policy)
            })?;

        log::debug!(
            "recomputed {}: {} -> {}",
            user_id,
            change.previous,
            change.current
        );
        if change.is_change() {
            log::info!(
                "verification status of {} is now {}",
                user_id,
                change.current
            );
            notify_all(&self.observers, &change);
        }
        Ok(change.current)
    }

    /// Stored profile of `user_id`, or an unverified one if none exists.
    pub fn profile(&self, user_id: &UserId) -> Result<VerificationProfile> {
        Ok(self
            .store
            .load_profile(user_id)?
            .unwrap_or_else(|| VerificationProfile::unverified(user_id.clone())))
    }
}
