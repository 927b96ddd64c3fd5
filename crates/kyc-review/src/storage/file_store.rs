//! File persistence — document records, profiles and audit entries as
//! JSON files.
//!
//! File formats:
//! ```json
//! { "version": 1, "document": { ... DocumentRecord ... } }
//! { "version": 1, "profile": { ... VerificationProfile ... } }
//! { "version": 1, "entry": { ... AuditEntry ... } }
//! ```
//!
//! Every file is written to a `.tmp` sibling and renamed into place.
//! Mutations take an in-process mutex and then an OS-level exclusive lock
//! on `{base_dir}/.lock`, so any number of handles and processes may share
//! one directory. The audit tail is read from disk under that lock.

use std::fs::{File, OpenOptions};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::audit::{AuditDraft, AuditEntry};
use crate::document::{DocumentId, DocumentRecord};
use crate::error::{KycError, Result};
use crate::identity::UserId;
use crate::profile::{StatusChange, VerificationProfile, VerificationStatus};
use crate::review::ReviewTransition;

use super::RecordStore;

// ── File format constants ─────────────────────────────────────────────────────

const RECORD_FILE_VERSION: u32 = 1;

const DOCUMENTS_DIR: &str = "documents";
const PROFILES_DIR: &str = "profiles";
const AUDIT_DIR: &str = "audit";
const LOCK_FILE: &str = ".lock";

// ── On-disk structures ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct DocumentFile {
    version: u32,
    document: DocumentRecord,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileFile {
    version: u32,
    profile: VerificationProfile,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuditFile {
    version: u32,
    entry: AuditEntry,
}

// ── Write lock ────────────────────────────────────────────────────────────────

/// Held for the duration of one mutation. Releases the directory lock
/// before the thread mutex.
struct WriteGuard<'a> {
    file: &'a File,
    _thread: MutexGuard<'a, ()>,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(self.file) {
            log::warn!("failed to release record store lock: {e}");
        }
    }
}

// ── FileStore ─────────────────────────────────────────────────────────────────

/// Filesystem-backed `RecordStore`.
pub struct FileStore {
    base_dir: PathBuf,
    lock_file: File,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (or create) a store rooted at `base_dir`.
    ///
    /// Creates `documents/`, `profiles/`, `audit/` and the lock file if
    /// missing.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(DOCUMENTS_DIR))?;
        std::fs::create_dir_all(base_dir.join(PROFILES_DIR))?;
        std::fs::create_dir_all(base_dir.join(AUDIT_DIR))?;

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(base_dir.join(LOCK_FILE))?;

        Ok(Self {
            base_dir,
            lock_file,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Serialise against other threads of this process, then against every
    /// other handle on the directory.
    fn lock(&self) -> Result<WriteGuard<'_>> {
        let thread = self
            .write_lock
            .lock()
            .map_err(|_| KycError::StorageError("record store lock poisoned".into()))?;
        FileExt::lock_exclusive(&self.lock_file).map_err(|e| {
            KycError::StorageError(format!(
                "failed to lock {}: {e}",
                self.base_dir.join(LOCK_FILE).display()
            ))
        })?;
        Ok(WriteGuard {
            file: &self.lock_file,
            _thread: thread,
        })
    }

    fn document_path(&self, id: &DocumentId) -> Result<PathBuf> {
        let mut components = Path::new(&id.0).components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single || id.0.contains(['/', '\\']) {
            return Err(KycError::Validation(format!("invalid document id: {id}")));
        }
        Ok(self
            .base_dir
            .join(DOCUMENTS_DIR)
            .join(format!("{}.json", id.0)))
    }

    fn profile_path(&self, user_id: &UserId) -> PathBuf {
        self.base_dir
            .join(PROFILES_DIR)
            .join(format!("{}.json", hex::encode(user_id.0.as_bytes())))
    }

    fn audit_path(&self, entry: &AuditEntry) -> PathBuf {
        self.base_dir
            .join(AUDIT_DIR)
            .join(format!("{:020}_{}.json", entry.sequence, entry.id.0))
    }

    /// Audit files in log order. Names start with the zero-padded sequence.
    fn audit_files(&self) -> Result<Vec<PathBuf>> {
        let mut paths = json_files(&self.base_dir.join(AUDIT_DIR))?;
        paths.sort();
        Ok(paths)
    }

    /// Last entry of the chain as it is on disk now. Caller holds the lock.
    fn audit_tail(&self) -> Result<Option<AuditEntry>> {
        match self.audit_files()?.last() {
            Some(path) => Ok(read_json::<AuditFile>(path)?.map(|f| f.entry)),
            None => Ok(None),
        }
    }

    fn write_document(&self, record: &DocumentRecord) -> Result<()> {
        write_json(
            &self.document_path(&record.id)?,
            &DocumentFile {
                version: RECORD_FILE_VERSION,
                document: record.clone(),
            },
        )
    }

    fn read_document(&self, id: &DocumentId) -> Result<Option<DocumentRecord>> {
        Ok(read_json::<DocumentFile>(&self.document_path(id)?)?.map(|f| f.document))
    }

    /// Seal and write the entry following `tail`. Caller holds the lock.
    fn write_audit(&self, tail: Option<&AuditEntry>, draft: AuditDraft) -> Result<AuditEntry> {
        let entry = AuditEntry::seal(
            draft,
            tail.map_or(1, |t| t.sequence + 1),
            tail.map(|t| t.entry_hash.clone()),
        );
        write_json(
            &self.audit_path(&entry),
            &AuditFile {
                version: RECORD_FILE_VERSION,
                entry: entry.clone(),
            },
        )?;
        Ok(entry)
    }

    fn scan_documents(&self, mut keep: impl FnMut(&DocumentRecord) -> bool) -> Result<Vec<DocumentRecord>> {
        let mut records = Vec::new();
        for path in json_files(&self.base_dir.join(DOCUMENTS_DIR))? {
            if let Some(file) = read_json::<DocumentFile>(&path)? {
                if keep(&file.document) {
                    records.push(file.document);
                }
            }
        }
        Ok(records)
    }
}

impl RecordStore for FileStore {
    fn insert_document(&self, record: &DocumentRecord) -> Result<()> {
        let _guard = self.lock()?;
        if self.document_path(&record.id)?.exists() {
            return Err(KycError::StorageError(format!(
                "document already exists: {}",
                record.id
            )));
        }
        self.write_document(record)
    }

    fn get_document(&self, id: &DocumentId) -> Result<Option<DocumentRecord>> {
        self.read_document(id)
    }

    fn documents_for_user(&self, user_id: &UserId) -> Result<Vec<DocumentRecord>> {
        self.scan_documents(|r| &r.user_id == user_id)
    }

    fn all_documents(&self) -> Result<Vec<DocumentRecord>> {
        self.scan_documents(|_| true)
    }

    fn delete_document(&self, id: &DocumentId) -> Result<Option<DocumentRecord>> {
        let _guard = self.lock()?;
        let existing = self.read_document(id)?;
        if existing.is_some() {
            std::fs::remove_file(self.document_path(id)?)?;
        }
        Ok(existing)
    }

    fn commit_review(&self, transition: &ReviewTransition) -> Result<(DocumentRecord, AuditEntry)> {
        let _guard = self.lock()?;

        let mut record = self.read_document(&transition.document_id)?.ok_or_else(|| {
            KycError::NotFound(format!("document not found: {}", transition.document_id))
        })?;

        // Another process may have written the tail with a clock ahead of ours.
        let tail = self.audit_tail()?;
        let reviewed_at = crate::time::now_micros()
            .max(tail.as_ref().map_or(0, |t| t.timestamp + 1));
        transition.apply(&mut record, reviewed_at)?;

        let entry = self.write_audit(tail.as_ref(), transition.audit_draft(&record, reviewed_at))?;

        if let Err(e) = self.write_document(&record) {
            // Roll the audit entry back so neither half of the unit survives.
            if let Err(cleanup) = std::fs::remove_file(self.audit_path(&entry)) {
                log::error!(
                    "failed to roll back audit entry {} after document write error: {cleanup}",
                    entry.id
                );
            }
            return Err(e);
        }

        Ok((record, entry))
    }

    fn append_audit(&self, draft: AuditDraft) -> Result<AuditEntry> {
        let _guard = self.lock()?;
        let tail = self.audit_tail()?;
        self.write_audit(tail.as_ref(), draft)
    }

    fn audit_entries(&self) -> Result<Vec<AuditEntry>> {
        let paths = self.audit_files()?;
        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(file) = read_json::<AuditFile>(&path)? {
                entries.push(file.entry);
            }
        }
        Ok(entries)
    }

    fn load_profile(&self, user_id: &UserId) -> Result<Option<VerificationProfile>> {
        Ok(read_json::<ProfileFile>(&self.profile_path(user_id))?.map(|f| f.profile))
    }

    fn refresh_profile(
        &self,
        user_id: &UserId,
        derive: &dyn Fn(&[DocumentRecord]) -> VerificationStatus,
    ) -> Result<StatusChange> {
        let _guard = self.lock()?;

        let records = self.documents_for_user(user_id)?;
        let current = derive(&records);

        let existing = self.load_profile(user_id)?;
        let previous = existing
            .as_ref()
            .map(|p| p.verification_status)
            .unwrap_or(VerificationStatus::Unverified);

        if existing.is_none() || previous != current {
            write_json(
                &self.profile_path(user_id),
                &ProfileFile {
                    version: RECORD_FILE_VERSION,
                    profile: VerificationProfile {
                        user_id: user_id.clone(),
                        verification_status: current,
                        updated_at: crate::time::now_micros(),
                    },
                },
            )?;
        }

        Ok(StatusChange {
            user_id: user_id.clone(),
            previous,
            current,
        })
    }
}

// ── JSON file helpers ─────────────────────────────────────────────────────────

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| KycError::SerializationError(e.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json.as_bytes())?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(KycError::Io(e)),
    };

    let value = serde_json::from_slice(&bytes).map_err(|e| {
        KycError::InvalidFileFormat(format!("failed to parse {}: {e}", path.display()))
    })?;
    Ok(Some(value))
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    Ok(paths)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
