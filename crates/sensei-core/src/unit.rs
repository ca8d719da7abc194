//! Unit identification and metadata.
//!
//! A "unit" is the (student, topic, subtopic) granularity at which tutoring
//! progress is tracked. All session state is partitioned by [`UnitKey`].

use crate::error::{Result, SenseiError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deriving deterministic storage IDs from unit keys.
const UNIT_KEY_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6b, 0x1e, 0x0d, 0x2f, 0x9c, 0x44, 0x4a, 0x7b, 0x8f, 0x53, 0xe2, 0x01, 0x7d, 0x5a, 0x33, 0x9e,
]);

/// Typed composite key identifying one tutoring unit.
///
/// Components are opaque strings supplied by the caller, never generated
/// here. Construction validates each component so that a malformed tuple is
/// rejected before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitKey {
    pub student_id: String,
    pub topic_id: String,
    pub subtopic_id: String,
}

impl UnitKey {
    /// Creates a validated unit key.
    ///
    /// # Errors
    ///
    /// Returns [`SenseiError::InvalidUnitKey`] if any component is empty
    /// after trimming or contains a path separator or NUL byte.
    pub fn new(
        student_id: impl Into<String>,
        topic_id: impl Into<String>,
        subtopic_id: impl Into<String>,
    ) -> Result<Self> {
        let key = Self {
            student_id: student_id.into(),
            topic_id: topic_id.into(),
            subtopic_id: subtopic_id.into(),
        };

        validate_component("student_id", &key.student_id)?;
        validate_component("topic_id", &key.topic_id)?;
        validate_component("subtopic_id", &key.subtopic_id)?;

        Ok(key)
    }

    /// Returns the deterministic storage ID for this key.
    ///
    /// Components are joined with a separator that `validate_component`
    /// guarantees cannot appear inside a component, so distinct keys can
    /// never collide on the same ID.
    pub fn storage_id(&self) -> Uuid {
        let joined = format!(
            "{}\u{1f}{}\u{1f}{}",
            self.student_id, self.topic_id, self.subtopic_id
        );
        Uuid::new_v5(&UNIT_KEY_NAMESPACE, joined.as_bytes())
    }
}

impl std::fmt::Display for UnitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.student_id, self.topic_id, self.subtopic_id
        )
    }
}

fn validate_component(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SenseiError::invalid_unit_key(format!(
            "{field} must not be empty"
        )));
    }
    if value.contains(['/', '\\', '\0', '\u{1f}']) {
        return Err(SenseiError::invalid_unit_key(format!(
            "{field} contains a forbidden character"
        )));
    }
    if value.len() > 256 {
        return Err(SenseiError::invalid_unit_key(format!(
            "{field} exceeds 256 bytes"
        )));
    }
    Ok(())
}

/// Curriculum metadata passed through verbatim into the prompt context.
///
/// This is an opaque bag from the engine's perspective: missing fields are
/// treated as empty and unknown fields are ignored. Legacy payloads used
/// `objective` for `goal` and `assignments` for `assignment_prompts`; the
/// serde aliases normalize both shapes at the boundary so the engine only
/// ever sees the canonical one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitMetadata {
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default, alias = "objective")]
    pub goal: String,
    #[serde(default, alias = "assignments")]
    pub assignment_prompts: Vec<String>,
}

impl UnitMetadata {
    /// Normalizes an arbitrary JSON payload into the canonical shape.
    ///
    /// Shape errors degrade to the empty metadata rather than failing the
    /// request; the engine does not validate curriculum content.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}
