//! Unified error type for the excelibur crate.
//!
//! Container errors keep their own kind so callers can still tell a
//! missing stream apart from a corrupt file; everything else around the
//! engine (file access, output writing) funnels through here.
use thiserror::Error;

/// Main error type for excelibur operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Compound container parsing failed
    #[error(transparent)]
    Ole(#[from] crate::ole::OleError),

    /// A collaborator (record decoder or document writer) failed
    #[error("Conversion error: {0}")]
    Conversion(String),
}

/// Result type for excelibur operations.
pub type Result<T> = std::result::Result<T, Error>;
