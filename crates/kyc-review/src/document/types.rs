//! Data structures for identity-document records.

use serde::{Deserialize, Serialize};

use crate::blob::StorageRef;
use crate::error::{KycError, Result};
use crate::identity::{ReviewerId, UserId};

// ---------------------------------------------------------------------------
// Document identifier
// ---------------------------------------------------------------------------

/// Unique identifier for a document record.
///
/// Format: `kdoc_` + base58.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub(crate) fn generate(user_id: &UserId, document_type: DocumentType) -> Self {
        Self(crate::identity::mint_id(
            "kdoc",
            &format!("{}:{}", user_id.0, document_type.as_str()),
        ))
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Document type
// ---------------------------------------------------------------------------

/// Kind of identity document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    DriversLicense,
    NationalId,
    ProofOfAddress,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        Self::Passport,
        Self::DriversLicense,
        Self::NationalId,
        Self::ProofOfAddress,
        Self::Other,
    ];

    /// Return a stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passport => "passport",
            Self::DriversLicense => "drivers_license",
            Self::NationalId => "national_id",
            Self::ProofOfAddress => "proof_of_address",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = KycError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| KycError::Validation(format!("unknown document type: {s}")))
    }
}

// ---------------------------------------------------------------------------
// Document status
// ---------------------------------------------------------------------------

/// Per-document review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Approved,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Approved and rejected records never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = KycError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(KycError::Validation(format!(
                "unknown document status: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// File metadata
// ---------------------------------------------------------------------------

/// File details declared by the submitter, before storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }
}

/// File details of a stored document, including its blob handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub storage_ref: StorageRef,
}

// ---------------------------------------------------------------------------
// Document record
// ---------------------------------------------------------------------------

/// One uploaded identity document and its review lifecycle.
///
/// `reviewer_id`, `reviewed_at` and `review_notes` are `None` while the
/// record is pending and are set exactly once, by the review transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub user_id: UserId,
    pub document_type: DocumentType,
    pub file: FileMetadata,
    pub status: DocumentStatus,
    pub reviewer_id: Option<ReviewerId>,
    pub reviewed_at: Option<u64>,
    pub review_notes: Option<String>,
    pub created_at: u64,
}

impl DocumentRecord {
    pub fn is_pending(&self) -> bool {
        self.status == DocumentStatus::Pending
    }
}

/// Newest first; `created_at` is unique within a process, the id breaks
/// ties between records loaded from elsewhere.
pub(crate) fn sort_newest_first(records: &mut [DocumentRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

// ---------------------------------------------------------------------------
// Admin listing
// ---------------------------------------------------------------------------

/// Filter for the admin review queue.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Only records in this status.
    pub status: Option<DocumentStatus>,
    /// Case-insensitive substring over file name, user id and document id.
    pub search: Option<String>,
    pub user_id: Option<UserId>,
}

impl DocumentFilter {
    pub fn status(status: DocumentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &DocumentRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if &record.user_id != user_id {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                record.file.name.to_lowercase().contains(&term)
                    || record.user_id.0.to_lowercase().contains(&term)
                    || record.id.0.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

/// Number of records in each review status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a DocumentRecord>) -> Self {
        let mut counts = Self::default();
        for record in records {
            match record.status {
                DocumentStatus::Pending => counts.pending += 1,
                DocumentStatus::Approved => counts.approved += 1,
                DocumentStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pending + self.approved + self.rejected
    }
}
