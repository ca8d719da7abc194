//! Infrastructure layer: durable storage for unit sessions.
//!
//! Provides the file-backed [`DirSessionStore`] implementation of
//! `sensei_core::session::SessionStore`, plus path resolution for the
//! default data directory.

pub mod dir_session_store;
pub mod dto;
pub mod paths;
pub mod storage;

pub use dir_session_store::DirSessionStore;
pub use paths::SenseiPaths;
