//! Session domain module.
//!
//! This module contains the per-unit session state, chat log types, and the
//! repository interface for durable session persistence.
//!
//! # Module Structure
//!
//! - `model`: Per-unit session state (`UnitSession`, `Phase`, `AssignmentCounts`)
//! - `message`: Chat log entry types (`ChatRole`, `ChatEntry`)
//! - `store`: Storage trait and partial-update type (`SessionStore`, `SessionPatch`)

mod message;
mod model;
mod store;

// Re-export public API
pub use message::{ChatEntry, ChatRole};
pub use model::{AssignmentCounts, MAX_CHAT_LOG, Phase, UnitSession};
pub use store::{SessionPatch, SessionStore};
