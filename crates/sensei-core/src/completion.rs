//! Completion capability interface.
//!
//! The external language model is modeled as a single capability: given a
//! prompt context, return free text. Implementations live outside this
//! crate (HTTP clients, scripted test doubles); the engine treats whatever
//! comes back as untrusted text that still has to go through the marker
//! parser.

use crate::error::Result;
use crate::session::ChatEntry;
use async_trait::async_trait;

/// Everything a completion backend needs for one request.
///
/// The system prompt is already rendered from the current phase's template;
/// the history carries the trailing chat log including the incoming user
/// message.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// Rendered system prompt for the current phase.
    pub system: String,
    /// Trailing conversation, oldest first.
    pub history: Vec<ChatEntry>,
}

impl PromptContext {
    pub fn new(system: impl Into<String>, history: Vec<ChatEntry>) -> Self {
        Self {
            system: system.into(),
            history,
        }
    }
}

/// An abstract free-text completion backend.
///
/// Best-effort, potentially slow, potentially failing. Implementations map
/// transport failures to
/// [`SenseiError::CompletionUnavailable`](crate::SenseiError::CompletionUnavailable)
/// and enforce a time bound that maps to
/// [`SenseiError::CompletionTimeout`](crate::SenseiError::CompletionTimeout),
/// so the engine can treat the whole class as "this turn did not happen".
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Requests one free-text completion for the given context.
    async fn complete(&self, ctx: &PromptContext) -> Result<String>;
}
