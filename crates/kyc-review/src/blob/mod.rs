//! Blob storage collaborator — opaque put/get/delete of document bytes.
//!
//! The core never interprets blob contents. It only requires that a `put`
//! is acknowledged before a document record referencing the blob is
//! created.
//!
//! # Modules
//!
//! - [`fs`] — directory-backed store used by the CLI.
//! - [`memory`] — in-process store for embedding and tests.

pub mod fs;
pub mod memory;

use serde::{Deserialize, Serialize};

use crate::document::DocumentType;
use crate::error::Result;
use crate::identity::UserId;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

/// Opaque handle into the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageRef(pub String);

impl std::fmt::Display for StorageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contract the core requires of the external blob store.
///
/// Implementations return `KycError::Dependency` when the store is
/// unreachable and `KycError::NotFound` for an unknown reference.
pub trait BlobStore: Send + Sync {
    /// Durably write `bytes` under `path` and return the handle to it.
    fn put(&self, path: &str, bytes: &[u8]) -> Result<StorageRef>;

    fn get(&self, storage_ref: &StorageRef) -> Result<Vec<u8>>;

    /// Remove a blob. Deleting an unknown reference is a no-op.
    fn delete(&self, storage_ref: &StorageRef) -> Result<()>;
}

/// Build a collision-free blob path for an uploaded file:
/// `{hex(user_id)}/{document_type}/{random}_{file_name}`.
///
/// Path separators and leading dots are stripped from the file name.
pub fn blob_path(user_id: &UserId, document_type: DocumentType, file_name: &str) -> String {
    let safe_name: String = file_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string();
    let nonce: [u8; 8] = rand::random();

    format!(
        "{}/{}/{}_{}",
        hex::encode(user_id.0.as_bytes()),
        document_type.as_str(),
        hex::encode(nonce),
        safe_name
    )
}
