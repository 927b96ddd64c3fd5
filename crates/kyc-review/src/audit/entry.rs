//! Audit entries — one per review action.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::document::DocumentId;
use crate::identity::{ReviewerId, UserId};
use crate::review::Decision;

/// Unique identifier for an audit entry.
///
/// Format: `kaud_` + base58.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditId(pub String);

impl std::fmt::Display for AuditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content of an audit entry before it is placed in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDraft {
    pub document_id: DocumentId,
    pub user_id: UserId,
    pub reviewer_id: ReviewerId,
    pub decision: Decision,
    pub notes: Option<String>,
    pub timestamp: u64,
}

/// An appended audit entry.
///
/// `document_id` and `user_id` are weak references: the entry stays valid
/// after the referenced record is purged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,
    /// Position in the log, starting at 1.
    pub sequence: u64,
    pub document_id: DocumentId,
    pub user_id: UserId,
    pub reviewer_id: ReviewerId,
    pub decision: Decision,
    pub notes: Option<String>,
    pub timestamp: u64,
    /// `entry_hash` of the preceding entry, `None` for the first.
    pub previous_hash: Option<String>,
    pub entry_hash: String,
}

impl AuditEntry {
    /// Place a draft at `sequence`, chained to the preceding entry's hash.
    pub fn seal(draft: AuditDraft, sequence: u64, previous_hash: Option<String>) -> Self {
        let entry_hash = compute_hash(
            sequence,
            &draft.document_id,
            &draft.user_id,
            &draft.reviewer_id,
            draft.decision,
            draft.notes.as_deref(),
            draft.timestamp,
            previous_hash.as_deref(),
        );
        let id_hash = Sha256::digest(entry_hash.as_bytes());
        let id = AuditId(format!("kaud_{}", bs58::encode(&id_hash[..16]).into_string()));

        Self {
            id,
            sequence,
            document_id: draft.document_id,
            user_id: draft.user_id,
            reviewer_id: draft.reviewer_id,
            decision: draft.decision,
            notes: draft.notes,
            timestamp: draft.timestamp,
            previous_hash,
            entry_hash,
        }
    }

    /// Recompute the hash over this entry's stored content.
    pub fn recompute_hash(&self) -> String {
        compute_hash(
            self.sequence,
            &self.document_id,
            &self.user_id,
            &self.reviewer_id,
            self.decision,
            self.notes.as_deref(),
            self.timestamp,
            self.previous_hash.as_deref(),
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn compute_hash(
    sequence: u64,
    document_id: &DocumentId,
    user_id: &UserId,
    reviewer_id: &ReviewerId,
    decision: Decision,
    notes: Option<&str>,
    timestamp: u64,
    previous_hash: Option<&str>,
) -> String {
    // Length-prefix free-text fields so ':' inside them cannot shift boundaries.
    let notes = notes.unwrap_or("");
    let hash_input = format!(
        "{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
        sequence,
        document_id.0,
        user_id.0.len(),
        user_id.0,
        reviewer_id.0.len(),
        reviewer_id.0,
        decision.as_str(),
        notes.len(),
        notes,
        timestamp,
    );
    let mut hasher = Sha256::new();
    hasher.update(hash_input.as_bytes());
    hasher.update(b":");
    hasher.update(previous_hash.unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}
