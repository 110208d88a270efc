//! OneView Managed SAN Common Library
//!
//! Shared data model and error type for the Managed SAN reconciler.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
