//! Unified error types for the excelibur library.

// Submodule declarations
pub mod types;

// Re-exports
pub use types::{Error, Result};
