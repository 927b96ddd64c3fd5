//! Resubmission policy — which records count toward a user's status.

use serde::{Deserialize, Serialize};

use crate::document::{DocumentRecord, DocumentStatus};

/// How rejected records are treated once the user submits again.
///
/// Rejected records are never mutated or deleted by resubmission; the
/// policy only decides whether they stay in the aggregation window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResubmissionPolicy {
    /// A rejected record leaves the window once the same user has a newer
    /// record of the same document type.
    #[default]
    SupersedeByType,
    /// Every rejected record counts for as long as it exists.
    Permanent,
}

impl ResubmissionPolicy {
    /// Records that take part in aggregation.
    pub fn window<'a>(&self, records: &'a [DocumentRecord]) -> Vec<&'a DocumentRecord> {
        match self {
            Self::Permanent => records.iter().collect(),
            Self::SupersedeByType => records
                .iter()
                .filter(|r| !is_superseded(r, records))
                .collect(),
        }
    }
}

fn is_superseded(record: &DocumentRecord, records: &[DocumentRecord]) -> bool {
    record.status == DocumentStatus::Rejected
        && records.iter().any(|other| {
            other.id != record.id
                && other.user_id == record.user_id
                && other.document_type == record.document_type
                && other.created_at > record.created_at
        })
}

impl std::str::FromStr for ResubmissionPolicy {
    type Err = crate::error::KycError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "supersede_by_type" => Ok(Self::SupersedeByType),
            "permanent" => Ok(Self::Permanent),
            other => Err(crate::error::KycError::Validation(format!(
                "unknown resubmission policy: {other}"
            ))),
        }
    }
}
