//! Directory-backed blob store.
//!
//! Each blob is a plain file at `{base_dir}/{path}`. Writes go to a
//! temporary sibling first and are renamed into place, so a reader never
//! observes a partially written blob.

use std::path::{Component, Path, PathBuf};

use crate::error::{KycError, Result};

use super::{BlobStore, StorageRef};

/// Filesystem-backed `BlobStore`.
pub struct FsBlobStore {
    base_dir: PathBuf,
}

impl FsBlobStore {
    /// Create a new `FsBlobStore` rooted at `base_dir`.
    ///
    /// The directory and any missing parents are created if they do not exist.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Resolve a relative blob path, refusing anything that escapes `base_dir`.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(KycError::Validation(format!("invalid blob path: {path}")));
        }
        Ok(self.base_dir.join(relative))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<StorageRef> {
        let target = self.resolve(path)?;
        let unavailable = |e: std::io::Error| {
            KycError::Dependency(format!("blob write failed for {path}: {e}"))
        };

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(unavailable)?;
        }
        let mut tmp_name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".partial");
        let tmp = target.with_file_name(tmp_name);
        std::fs::write(&tmp, bytes).map_err(unavailable)?;
        std::fs::rename(&tmp, &target).map_err(unavailable)?;

        Ok(StorageRef(path.to_string()))
    }

    fn get(&self, storage_ref: &StorageRef) -> Result<Vec<u8>> {
        let path = self.resolve(&storage_ref.0)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(KycError::NotFound(
                format!("blob not found: {storage_ref}"),
            )),
            Err(e) => Err(KycError::Dependency(format!(
                "blob read failed for {storage_ref}: {e}"
            ))),
        }
    }

    fn delete(&self, storage_ref: &StorageRef) -> Result<()> {
        let path = self.resolve(&storage_ref.0)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KycError::Dependency(format!(
                "blob delete failed for {storage_ref}: {e}"
            ))),
        }
    }
}
