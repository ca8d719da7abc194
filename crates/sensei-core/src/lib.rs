pub mod completion;
pub mod error;
pub mod marker;
pub mod phase;
pub mod session;
pub mod unit;

// Re-export common error type
pub use error::SenseiError;
