//! Low-level storage primitives.

mod atomic;

pub use atomic::{FileGuard, load_toml, store_toml};
