//! Path resolution for Sensei's data directory.

use sensei_core::error::{Result, SenseiError};
use std::path::PathBuf;

/// Resolves the default filesystem locations used by Sensei.
pub struct SenseiPaths;

impl SenseiPaths {
    /// Returns the base data directory (`~/.local/share/sensei` on Linux).
    ///
    /// # Errors
    ///
    /// Returns [`SenseiError::StorageUnavailable`] if the platform data
    /// directory cannot be determined.
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("sensei"))
            .ok_or_else(|| {
                SenseiError::storage_unavailable("could not determine platform data directory")
            })
    }
}
