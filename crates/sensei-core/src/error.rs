//! Error types for the Sensei tutoring backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Sensei backend.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum SenseiError {
    /// The durable session store cannot be reached or initialized.
    ///
    /// Fatal for the request: no partial writes occur, and the engine
    /// must never proceed with in-memory-only state.
    #[error("Session storage unavailable: {reason}")]
    StorageUnavailable { reason: String },

    /// The external completion capability failed or returned an error.
    ///
    /// Recoverable at the turn boundary: callers swallow this class into
    /// a fixed fallback message and leave session state untouched.
    #[error("Completion unavailable: {0}")]
    CompletionUnavailable(String),

    /// The external completion capability exceeded its time bound.
    #[error("Completion timed out after {seconds}s")]
    CompletionTimeout { seconds: u64 },

    /// A malformed unit key tuple, rejected before any store access.
    #[error("Invalid unit key: {0}")]
    InvalidUnitKey(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SenseiError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a StorageUnavailable error
    pub fn storage_unavailable(reason: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates a CompletionUnavailable error
    pub fn completion_unavailable(message: impl Into<String>) -> Self {
        Self::CompletionUnavailable(message.into())
    }

    /// Creates an InvalidUnitKey error
    pub fn invalid_unit_key(message: impl Into<String>) -> Self {
        Self::InvalidUnitKey(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }

    /// Check if this error belongs to the completion-failure class.
    ///
    /// This class is always recoverable: the turn is treated as not having
    /// happened, and the caller receives a fallback message instead.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Self::CompletionUnavailable(_) | Self::CompletionTimeout { .. }
        )
    }

    /// Check if this is an invalid-key error
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Self::InvalidUnitKey(_))
    }

    /// Check if this is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for SenseiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for SenseiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SenseiError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for SenseiError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (transitional, should be removed eventually)
impl From<anyhow::Error> for SenseiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, SenseiError>`.
pub type Result<T> = std::result::Result<T, SenseiError>;
