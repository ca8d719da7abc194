//! Completion capability implementations.
//!
//! - [`ChatApiClient`]: OpenAI-style chat completions over HTTP with a hard
//!   timeout.
//! - [`ScriptedClient`]: canned replies for tests and offline development.

pub mod chat_api_client;
pub mod config;
pub mod scripted;

pub use chat_api_client::ChatApiClient;
pub use config::CompletionConfig;
pub use scripted::ScriptedClient;
