//! Session store trait.
//!
//! Defines the interface for durable, keyed session persistence.

use super::message::ChatEntry;
use super::model::{AssignmentCounts, Phase, UnitSession};
use crate::error::Result;
use crate::unit::UnitKey;
use async_trait::async_trait;

/// A partial update merged into a stored session record.
///
/// Fields left as `None` (or empty, for `append`) keep the stored value.
/// `clear_log` is applied before `append`, so a patch can atomically replace
/// the log with fresh entries.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub phase: Option<Phase>,
    pub counts: Option<AssignmentCounts>,
    pub clear_log: bool,
    pub append: Vec<ChatEntry>,
}

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn counts(mut self, counts: AssignmentCounts) -> Self {
        self.counts = Some(counts);
        self
    }

    pub fn clear_log(mut self) -> Self {
        self.clear_log = true;
        self
    }

    pub fn append(mut self, entries: impl IntoIterator<Item = ChatEntry>) -> Self {
        self.append.extend(entries);
        self
    }

    /// Applies this patch to a session in memory.
    ///
    /// Store implementations call this inside their per-key critical
    /// section so every backend merges identically.
    pub fn apply(&self, session: &mut UnitSession) {
        if let Some(phase) = self.phase {
            session.phase = phase;
        }
        if let Some(counts) = self.counts {
            session.counts = counts;
        }
        if self.clear_log {
            session.chat_log.clear();
        }
        if !self.append.is_empty() {
            session.append(self.append.iter().cloned());
        }
    }
}

/// An abstract store for per-unit session state.
///
/// This trait defines the contract for persisting and retrieving unit
/// sessions, decoupling the tutoring engine from the specific storage
/// mechanism (e.g., TOML files, database, remote API).
///
/// # Implementation Notes
///
/// Implementations must guarantee:
/// - `read` never fails with "not found": unknown keys synthesize the
///   default state without persisting it.
/// - `write` durably flushes before returning; a write must never be
///   acknowledged before it is committed to stable storage.
/// - The read-modify-write of a single `write` call is atomic per key.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Reads the session for a unit, synthesizing the default state for
    /// unknown keys.
    async fn read(&self, key: &UnitKey) -> Result<UnitSession>;

    /// Merges a partial update into the stored record (creating it if
    /// needed), stamps `last_activity`, persists durably, and returns the
    /// resulting record.
    async fn write(&self, key: &UnitKey, patch: SessionPatch) -> Result<UnitSession>;

    /// Clears a unit back to its default state: learning phase, zero
    /// counts, empty log.
    async fn reset(&self, key: &UnitKey) -> Result<UnitSession> {
        self.write(
            key,
            SessionPatch::new()
                .phase(Phase::Learning)
                .counts(AssignmentCounts::default())
                .clear_log(),
        )
        .await
    }

    /// Appends chat entries, trimming to the most recent
    /// [`MAX_CHAT_LOG`](super::MAX_CHAT_LOG) while preserving order.
    async fn append_log(&self, key: &UnitKey, entries: Vec<ChatEntry>) -> Result<UnitSession> {
        self.write(key, SessionPatch::new().append(entries)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_merges_fields() {
        let mut session = UnitSession::default();
        let patch = SessionPatch::new()
            .phase(Phase::Assignment)
            .counts(AssignmentCounts {
                completed: 1,
                total: 2,
            })
            .append([ChatEntry::user("hi")]);

        patch.apply(&mut session);

        assert_eq!(session.phase, Phase::Assignment);
        assert_eq!(session.counts.total, 2);
        assert_eq!(session.chat_log.len(), 1);
    }

    #[test]
    fn test_patch_clear_log_runs_before_append() {
        let mut session = UnitSession::default();
        session.append([ChatEntry::user("old")]);

        SessionPatch::new()
            .clear_log()
            .append([ChatEntry::assistant("fresh")])
            .apply(&mut session);

        assert_eq!(session.chat_log.len(), 1);
        assert_eq!(session.chat_log[0].content, "fresh");
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let mut session = UnitSession::default();
        session.phase = Phase::Assignment;
        session.append([ChatEntry::user("kept")]);
        let before = session.clone();

        SessionPatch::new().apply(&mut session);

        assert_eq!(session, before);
    }
}
