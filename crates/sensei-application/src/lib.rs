//! Application layer: the tutoring engine exposed to the API surface.
//!
//! [`LessonService`] is the entry point the surrounding HTTP layer calls:
//! `start_unit`, `turn`, and `history` per (student, topic, subtopic) unit.
//! Prompt rendering lives in [`prompt`]; everything stateful goes through
//! the `SessionStore` from `sensei-core`.

pub mod lesson_service;
pub mod prompt;

pub use lesson_service::{
    FALLBACK_MESSAGE, HistoryOutput, LessonService, StartOutput, TurnOutput,
};
pub use prompt::PromptRenderer;
