//! Storage DTOs.
//!
//! On-disk document shapes are versioned and kept separate from the domain
//! models so the persisted format can evolve without touching the engine.

mod session;

pub use session::{ChatEntryDoc, UnitSessionDoc};
