//! Data structures for review decisions.

use serde::{Deserialize, Serialize};

use crate::audit::{AuditDraft, AuditId};
use crate::document::{DocumentId, DocumentRecord, DocumentStatus};
use crate::error::{KycError, Result};
use crate::identity::ReviewerId;
use crate::profile::VerificationStatus;

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// An administrator's decision on one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    /// Terminal document status this decision leads to.
    pub fn resulting_status(&self) -> DocumentStatus {
        match self {
            Self::Approve => DocumentStatus::Approved,
            Self::Reject => DocumentStatus::Rejected,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Decision {
    type Err = KycError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(KycError::Validation(format!("unknown decision: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// A validated `pending → approved|rejected` transition, ready to commit.
///
/// Carries no timestamp: the store stamps it inside the same critical
/// section that assigns the audit sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTransition {
    pub document_id: DocumentId,
    pub reviewer_id: ReviewerId,
    pub decision: Decision,
    pub notes: Option<String>,
}

impl ReviewTransition {
    /// Validate the inputs of a decision and build the transition.
    ///
    /// Notes are trimmed; blank notes become `None`. Rejecting requires notes.
    pub fn new(
        document_id: DocumentId,
        reviewer_id: ReviewerId,
        decision: Decision,
        notes: Option<&str>,
    ) -> Result<Self> {
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        if decision == Decision::Reject && notes.is_none() {
            return Err(KycError::Validation(
                "notes are required when rejecting a document".into(),
            ));
        }
        if reviewer_id.0.trim().is_empty() {
            return Err(KycError::Validation("reviewer id is required".into()));
        }

        Ok(Self {
            document_id,
            reviewer_id,
            decision,
            notes,
        })
    }

    /// Apply the transition to `record` as a compare-and-swap on `status`,
    /// stamped at `reviewed_at`.
    ///
    /// Succeeds only if the record is still `pending`; otherwise returns
    /// `KycError::Conflict` and leaves the record untouched.
    pub fn apply(&self, record: &mut DocumentRecord, reviewed_at: u64) -> Result<()> {
        if record.id != self.document_id {
            return Err(KycError::NotFound(format!(
                "document not found: {}",
                self.document_id
            )));
        }
        if record.status != DocumentStatus::Pending {
            return Err(KycError::Conflict {
                document_id: record.id.0.clone(),
                current: record.status,
            });
        }

        record.status = self.decision.resulting_status();
        record.reviewer_id = Some(self.reviewer_id.clone());
        record.reviewed_at = Some(reviewed_at);
        record.review_notes = self.notes.clone();
        Ok(())
    }

    /// Audit draft describing this transition for `record`'s owner.
    pub fn audit_draft(&self, record: &DocumentRecord, reviewed_at: u64) -> AuditDraft {
        AuditDraft {
            document_id: self.document_id.clone(),
            user_id: record.user_id.clone(),
            reviewer_id: self.reviewer_id.clone(),
            decision: self.decision,
            notes: self.notes.clone(),
            timestamp: reviewed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of a successful decision.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub document: DocumentRecord,
    pub audit_id: AuditId,
    pub verification_status: VerificationStatus,
}
