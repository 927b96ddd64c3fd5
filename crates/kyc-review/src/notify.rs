//! Notification collaborator — observers of verification status changes.
//!
//! Delivery is fire-and-forget. An observer error is logged and never
//! rolls back the transition that caused the change.

use crate::error::Result;
use crate::profile::StatusChange;

/// Receives every change of a user's `verification_status`.
pub trait StatusObserver: Send + Sync {
    fn status_changed(&self, change: &StatusChange) -> Result<()>;
}

impl<F> StatusObserver for F
where
    F: Fn(&StatusChange) -> Result<()> + Send + Sync,
{
    fn status_changed(&self, change: &StatusChange) -> Result<()> {
        self(change)
    }
}

/// Observer that writes each change to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl StatusObserver for LogObserver {
    fn status_changed(&self, change: &StatusChange) -> Result<()> {
        log::info!(
            "verification status of {} changed: {} -> {}",
            change.user_id,
            change.previous,
            change.current
        );
        Ok(())
    }
}

/// Deliver `change` to every observer, logging failures.
pub(crate) fn notify_all(observers: &[std::sync::Arc<dyn StatusObserver>], change: &StatusChange) {
    for observer in observers {
        if let Err(e) = observer.status_changed(change) {
            log::warn!(
                "status observer failed for {} ({} -> {}): {e}",
                change.user_id,
                change.previous,
                change.current
            );
        }
    }
}
