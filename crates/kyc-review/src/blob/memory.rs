//! In-process blob store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::{KycError, Result};

use super::{BlobStore, StorageRef};

/// `BlobStore` holding blobs in a map.
///
/// The store can be switched offline, after which every call fails with
/// `KycError::Dependency`, the same way an unreachable remote store would.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    offline: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(KycError::Dependency("blob store offline".into()));
        }
        Ok(())
    }
}

fn poisoned() -> KycError {
    KycError::Dependency("blob store lock poisoned".into())
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<StorageRef> {
        self.check_online()?;
        self.blobs
            .write()
            .map_err(|_| poisoned())?
            .insert(path.to_string(), bytes.to_vec());
        Ok(StorageRef(path.to_string()))
    }

    fn get(&self, storage_ref: &StorageRef) -> Result<Vec<u8>> {
        self.check_online()?;
        self.blobs
            .read()
            .map_err(|_| poisoned())?
            .get(&storage_ref.0)
            .cloned()
            .ok_or_else(|| KycError::NotFound(format!("blob not found: {storage_ref}")))
    }

    fn delete(&self, storage_ref: &StorageRef) -> Result<()> {
        self.check_online()?;
        self.blobs
            .write()
            .map_err(|_| poisoned())?
            .remove(&storage_ref.0);
        Ok(())
    }
}
