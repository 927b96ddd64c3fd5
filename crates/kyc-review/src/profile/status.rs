//! Verification status and the pure aggregation over document records.

use serde::{Deserialize, Serialize};

use crate::document::{DocumentRecord, DocumentStatus};
use crate::identity::UserId;

use super::policy::ResubmissionPolicy;

// ---------------------------------------------------------------------------
// Verification status
// ---------------------------------------------------------------------------

/// User-level status derived from all of the user's document records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Unverified,
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Profile and change records
// ---------------------------------------------------------------------------

/// Persisted verification profile of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationProfile {
    pub user_id: UserId,
    pub verification_status: VerificationStatus,
    pub updated_at: u64,
}

impl VerificationProfile {
    /// Profile of a user the core has never seen.
    pub fn unverified(user_id: UserId) -> Self {
        Self {
            user_id,
            verification_status: VerificationStatus::Unverified,
            updated_at: 0,
        }
    }
}

/// Result of one recompute: the status before and after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub user_id: UserId,
    pub previous: VerificationStatus,
    pub current: VerificationStatus,
}

impl StatusChange {
    pub fn is_change(&self) -> bool {
        self.previous != self.current
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Derive a user's verification status from their document records.
///
/// Rules, in order:
/// 1. no records in the aggregation window → `Unverified`
/// 2. every record approved → `Verified`
/// 3. any record rejected → `Rejected`
/// 4. otherwise (pending mixed with approved) → `Pending`
///
/// The aggregation window is chosen by `policy`; see [`ResubmissionPolicy`].
pub fn aggregate(records: &[DocumentRecord], policy: ResubmissionPolicy) -> VerificationStatus {
    let window = policy.window(records);

    if window.is_empty() {
        return VerificationStatus::Unverified;
    }
    if window.iter().all(|r| r.status == DocumentStatus::Approved) {
        return VerificationStatus::Verified;
    }
    if window.iter().any(|r| r.status == DocumentStatus::Rejected) {
        return VerificationStatus::Rejected;
    }
    VerificationStatus::Pending
}
