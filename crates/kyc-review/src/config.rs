//! Service configuration.
//!
//! Loaded from a JSON file; every field has a default, so a partial file
//! (or none at all) is valid:
//!
//! ```json
//! {
//!     "max_file_size": 10485760,
//!     "allowed_mime_types": ["image/jpeg", "image/png", "application/pdf"],
//!     "resubmission_policy": "supersede_by_type"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::FileDescriptor;
use crate::error::{KycError, Result};
use crate::profile::ResubmissionPolicy;

/// Default upload limit: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// MIME types accepted for identity documents by default.
pub const DEFAULT_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KycConfig {
    /// Largest accepted upload, in bytes.
    pub max_file_size: u64,
    /// Declared MIME types accepted on upload. Empty accepts any type.
    pub allowed_mime_types: Vec<String>,
    pub resubmission_policy: ResubmissionPolicy,
}

impl Default for KycConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: DEFAULT_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            resubmission_policy: ResubmissionPolicy::default(),
        }
    }
}

impl KycConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// `KycError::Io` if the file cannot be read, `KycError::InvalidFileFormat`
    /// if it is not valid configuration JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            KycError::InvalidFileFormat(format!("invalid config {}: {e}", path.display()))
        })
    }

    /// Check an upload against the size and MIME limits.
    pub fn check_upload(&self, file: &FileDescriptor) -> Result<()> {
        if file.size == 0 {
            return Err(KycError::Validation(format!("file {} is empty", file.name)));
        }
        if file.size > self.max_file_size {
            return Err(KycError::Validation(format!(
                "file {} is {} bytes, limit is {}",
                file.name, file.size, self.max_file_size
            )));
        }
        let mime = file.mime_type.trim().to_ascii_lowercase();
        if !self.allowed_mime_types.is_empty()
            && !self
                .allowed_mime_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(&mime))
        {
            return Err(KycError::Validation(format!(
                "file {} has unsupported type {}",
                file.name, file.mime_type
            )));
        }
        Ok(())
    }
}
