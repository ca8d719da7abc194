//! Chat log entry types.

use serde::{Deserialize, Serialize};

/// Represents the sender of a chat log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Message from the learner.
    User,
    /// Message from the tutor.
    Assistant,
}

/// A single entry in a unit's chat log.
///
/// Each entry has a role, the user-visible content (sentinel tokens already
/// stripped for assistant entries), and an RFC 3339 timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    /// The role of the message sender.
    pub role: ChatRole,
    /// The content of the message.
    pub content: String,
    /// Timestamp when the entry was created (RFC 3339 format).
    pub timestamp: String,
}

impl ChatEntry {
    /// Creates a learner entry stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates a tutor entry stamped with the current time.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
