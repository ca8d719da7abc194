//! Per-unit session state.
//!
//! This module contains the domain model for one tutoring unit's durable
//! state: the current phase, assignment bookkeeping, and the bounded chat
//! log. It is independent of any specific storage format.

use super::message::ChatEntry;
use serde::{Deserialize, Serialize};

/// Maximum number of chat log entries retained per unit.
///
/// Appends beyond this bound discard the oldest entries first.
pub const MAX_CHAT_LOG: usize = 50;

/// The pedagogical mode a unit is currently in.
///
/// Phases only move forward (`Learning` to `Assignment`); the only way back
/// is a full reset. A mastered subtopic is reported as a one-shot flag to
/// the caller and is not a phase of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Guided instruction before any assignment is issued.
    #[default]
    Learning,
    /// Practice assignments with completion bookkeeping.
    Assignment,
}

/// Assignment bookkeeping for a unit.
///
/// `completed` and `total` only move in lockstep within a lesson cycle, so
/// `completed <= total` holds by construction. Both reset to zero on an
/// explicit unit restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentCounts {
    pub completed: u32,
    pub total: u32,
}

impl AssignmentCounts {
    /// Records one finished assignment.
    pub fn record_completed(&mut self) {
        self.completed += 1;
        self.total += 1;
    }
}

/// The durable state of one tutoring unit.
///
/// Created lazily: reads of an unknown unit synthesize this default, but
/// nothing is persisted until the first mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitSession {
    /// Current pedagogical phase.
    pub phase: Phase,
    /// Assignment completion bookkeeping.
    pub counts: AssignmentCounts,
    /// Bounded chat log, oldest first.
    pub chat_log: Vec<ChatEntry>,
    /// Timestamp of the last mutation (RFC 3339), empty until first write.
    pub last_activity: String,
}

impl UnitSession {
    /// Appends entries to the chat log, then trims to [`MAX_CHAT_LOG`]
    /// keeping the most recent entries in their original order.
    pub fn append(&mut self, entries: impl IntoIterator<Item = ChatEntry>) {
        self.chat_log.extend(entries);
        if self.chat_log.len() > MAX_CHAT_LOG {
            let excess = self.chat_log.len() - MAX_CHAT_LOG;
            self.chat_log.drain(..excess);
        }
    }

    /// Returns the most recent `n` log entries in order.
    pub fn trailing_log(&self, n: usize) -> &[ChatEntry] {
        let start = self.chat_log.len().saturating_sub(n);
        &self.chat_log[start..]
    }
}
