//! Directory-backed session store.
//!
//! One TOML document per unit key, named by the key's deterministic UUID.
//! All mutation goes through an advisory per-document lock plus an atomic
//! temp-file + fsync + rename write, so a `write` acknowledged to the
//! caller has been committed to stable storage.

use crate::dto::UnitSessionDoc;
use crate::paths::SenseiPaths;
use crate::storage::{FileGuard, load_toml, store_toml};
use async_trait::async_trait;
use sensei_core::error::{Result, SenseiError};
use sensei_core::session::{SessionPatch, SessionStore, UnitSession};
use sensei_core::unit::UnitKey;
use std::path::{Path, PathBuf};

/// File-backed [`SessionStore`] with one document per unit key.
///
/// Directory structure:
/// ```text
/// base_dir/
/// └── units/
///     ├── 6b1e0d2f-....toml
///     └── 93f2a1c8-....toml
/// ```
pub struct DirSessionStore {
    units_dir: PathBuf,
}

impl DirSessionStore {
    /// Creates a store at the default location (platform data dir).
    ///
    /// # Errors
    ///
    /// Returns [`SenseiError::StorageUnavailable`] if the storage medium
    /// cannot be initialized. No store operation falls back to memory-only
    /// state after a failed initialization.
    pub async fn default_location() -> Result<Self> {
        Self::new(SenseiPaths::data_dir()?).await
    }

    /// Creates a store rooted at `base_dir`.
    ///
    /// Initialization creates the units directory and probes it writable;
    /// either failing surfaces as [`SenseiError::StorageUnavailable`].
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let units_dir = base_dir.as_ref().join("units");

        tokio::fs::create_dir_all(&units_dir).await.map_err(|e| {
            SenseiError::storage_unavailable(format!(
                "cannot create {}: {e}",
                units_dir.display()
            ))
        })?;

        // Probe writability up front so a read-only medium fails loudly at
        // initialization instead of on the first lesson turn.
        let probe = units_dir.join(".probe");
        tokio::fs::write(&probe, b"ok").await.map_err(|e| {
            SenseiError::storage_unavailable(format!("{} is not writable: {e}", units_dir.display()))
        })?;
        let _ = tokio::fs::remove_file(&probe).await;

        Ok(Self { units_dir })
    }

    fn unit_path(&self, key: &UnitKey) -> PathBuf {
        self.units_dir.join(format!("{}.toml", key.storage_id()))
    }

    fn load_or_default(path: &Path) -> Result<UnitSession> {
        Ok(load_toml::<UnitSessionDoc>(path)?
            .map(UnitSessionDoc::into_domain)
            .unwrap_or_default())
    }
}

#[async_trait]
impl SessionStore for DirSessionStore {
    async fn read(&self, key: &UnitKey) -> Result<UnitSession> {
        // Reads never persist the synthesized default for unknown keys.
        let path = self.unit_path(key);
        tokio::task::spawn_blocking(move || Self::load_or_default(&path))
            .await
            .map_err(|e| SenseiError::internal(format!("storage task failed: {e}")))?
    }

    async fn write(&self, key: &UnitKey, patch: SessionPatch) -> Result<UnitSession> {
        let path = self.unit_path(key);

        // The advisory lock can block on another process; keep the whole
        // read-modify-write off the async executor threads.
        let session = tokio::task::spawn_blocking(move || -> Result<UnitSession> {
            let _guard = FileGuard::acquire(&path)?;

            let mut session = Self::load_or_default(&path)?;
            patch.apply(&mut session);
            session.last_activity = chrono::Utc::now().to_rfc3339();

            store_toml(&path, &UnitSessionDoc::from(&session))?;
            Ok(session)
        })
        .await
        .map_err(|e| SenseiError::internal(format!("storage task failed: {e}")))??;

        tracing::debug!(unit = %key, phase = ?session.phase, "persisted session");
        Ok(session)
    }
}
