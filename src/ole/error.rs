//! Error types for compound file parsing

use crate::common::binary::BinaryError;
use std::io;
use thiserror::Error;

/// Result type alias for container operations
pub type OleResult<T> = Result<T, OleError>;

/// Errors that can occur while parsing a compound container.
///
/// Every stage fails fast; messages carry the offending sector or entry
/// index so a corrupt file can be diagnosed without a hex editor.
#[derive(Error, Debug)]
pub enum OleError {
    /// I/O error while loading the input buffer
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Buffer smaller than a stage requires
    #[error("Truncated input: expected at least {expected} bytes, got {available}")]
    TruncatedInput {
        /// Bytes required
        expected: usize,
        /// Bytes present
        available: usize,
    },

    /// The first eight bytes are not the compound file magic
    #[error("Not an OLE file: invalid signature")]
    InvalidSignature,

    /// Out-of-range index, short or cyclic chain, or missing mini table
    #[error("Corrupted file: {0}")]
    CorruptStructure(String),

    /// No directory entry has the root storage type
    #[error("Corrupted file: directory has no root storage entry")]
    MissingRootStorage,

    /// No stream entry carries the requested name
    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    /// Input rejected by the configured size limit
    #[error("Input of {actual} bytes exceeds the configured limit of {limit} bytes")]
    InputTooLarge {
        /// Configured limit
        limit: usize,
        /// Actual input length
        actual: usize,
    },
}

impl OleError {
    /// Shorthand for building a [`OleError::CorruptStructure`].
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        OleError::CorruptStructure(message.into())
    }
}

impl From<BinaryError> for OleError {
    fn from(err: BinaryError) -> Self {
        match err {
            BinaryError::InsufficientData {
                expected,
                available,
            } => OleError::TruncatedInput {
                expected,
                available,
            },
        }
    }
}
