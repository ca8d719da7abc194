//! Persisted session document.

use sensei_core::session::{ChatEntry, ChatRole, Phase, UnitSession};
use serde::{Deserialize, Serialize};

const CURRENT_VERSION: u32 = 1;

/// The on-disk shape of one unit's session, one TOML document per unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSessionDoc {
    /// Document format version.
    #[serde(default = "default_version")]
    pub version: u32,
    pub phase: Phase,
    pub completed: u32,
    pub total: u32,
    #[serde(default)]
    pub chat_log: Vec<ChatEntryDoc>,
    #[serde(default)]
    pub last_activity: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

/// One persisted chat log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntryDoc {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: String,
}

impl From<&UnitSession> for UnitSessionDoc {
    fn from(session: &UnitSession) -> Self {
        Self {
            version: CURRENT_VERSION,
            phase: session.phase,
            completed: session.counts.completed,
            total: session.counts.total,
            chat_log: session
                .chat_log
                .iter()
                .map(|entry| ChatEntryDoc {
                    role: entry.role,
                    content: entry.content.clone(),
                    timestamp: entry.timestamp.clone(),
                })
                .collect(),
            last_activity: session.last_activity.clone(),
        }
    }
}

impl UnitSessionDoc {
    /// Converts the persisted document back into the domain model.
    pub fn into_domain(self) -> UnitSession {
        UnitSession {
            phase: self.phase,
            counts: sensei_core::session::AssignmentCounts {
                completed: self.completed,
                total: self.total,
            },
            chat_log: self
                .chat_log
                .into_iter()
                .map(|entry| ChatEntry {
                    role: entry.role,
                    content: entry.content,
                    timestamp: entry.timestamp,
                })
                .collect(),
            last_activity: self.last_activity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_state() {
        let mut session = UnitSession {
            phase: Phase::Assignment,
            counts: sensei_core::session::AssignmentCounts {
                completed: 2,
                total: 3,
            },
            chat_log: vec![],
            last_activity: "2026-01-01T00:00:00Z".to_string(),
        };
        session.append([ChatEntry::user("hi"), ChatEntry::assistant("hello")]);

        let doc = UnitSessionDoc::from(&session);
        assert_eq!(doc.version, CURRENT_VERSION);

        let restored = doc.into_domain();
        assert_eq!(restored, session);
    }
}
