//! Atomic TOML document I/O.
//!
//! Every persisted write goes through a temp file, an explicit fsync, and
//! an atomic rename, so a crash mid-write leaves either the old document or
//! the new one — never a torn file. [`FileGuard`] adds an advisory lock so
//! one document's read-modify-write cannot interleave with another
//! process's.

use sensei_core::error::{Result, SenseiError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// Loads and deserializes a TOML document.
///
/// Returns `Ok(None)` when the file does not exist or is empty; a document
/// that exists but fails to parse is surfaced as a serialization error, not
/// silently replaced with a default.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    let value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Serializes and durably writes a TOML document.
///
/// The data is synced to disk before the rename; when this returns `Ok`,
/// the write has been committed to stable storage.
pub fn store_toml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        SenseiError::io(format!("path has no parent directory: {}", path.display()))
    })?;
    fs::create_dir_all(parent)?;

    let rendered = toml::to_string_pretty(value)?;

    let tmp_path = temp_path(path)?;
    let mut tmp_file = File::create(&tmp_path)?;
    tmp_file.write_all(rendered.as_bytes())?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let parent = path.parent().ok_or_else(|| {
        SenseiError::io(format!("path has no parent directory: {}", path.display()))
    })?;
    let file_name = path
        .file_name()
        .ok_or_else(|| SenseiError::io(format!("path has no file name: {}", path.display())))?;
    Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
}

/// An advisory exclusive lock scoped to one document.
///
/// Held for the duration of a read-modify-write; released (and the lock
/// file removed, best effort) on drop.
pub struct FileGuard {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileGuard {
    /// Acquires an exclusive lock for the document at `path`.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| SenseiError::io(format!("failed to acquire lock: {e}")))?;
        }

        Ok(Self { file, lock_path })
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        // Unlock is automatic when the file handle is dropped.
        let _ = fs::remove_file(&self.lock_path);
    }
}
