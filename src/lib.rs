//! Excelibur - extraction of named streams from legacy compound documents
//!
//! Legacy `.xls` workbooks (and `.doc`/`.ppt` files) are OLE2 compound files:
//! a small file system packed into sectors, with its own allocation table,
//! directory and a secondary "mini" allocation scheme for small streams.
//! This crate parses that container from an in-memory buffer and hands back
//! the exact bytes of any named stream.
//!
//! Input is treated as untrusted: out-of-range indices, truncated sectors
//! and cyclic chains are all reported as errors, never followed blindly.
//!
//! # Example - Extracting the workbook stream
//!
//! ```no_run
//! use excelibur::ole::CompoundFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = CompoundFile::open("budget.xls")?;
//!
//! // Tries "Workbook" first, then the BIFF5 name "Book"
//! let workbook = file.workbook_stream()?;
//! println!("{}: {} bytes", workbook.name, workbook.data.len());
//!
//! // List everything else in the container
//! for path in file.list_streams()? {
//!     println!("Stream: {}", path.join("/"));
//! }
//! # Ok(())
//! # }
//! ```

/// Shared error type and binary helpers
pub mod common;

/// OLE2 (Object Linking and Embedding) compound file parser
///
/// This module provides functionality to parse OLE2 structured storage files,
/// which are used by legacy Microsoft Office formats (.doc, .xls, .ppt).
pub mod ole;

// Re-export commonly used types for convenience
pub use common::{Error, Result};
pub use ole::{CompoundFile, OleError, ParseOptions, WorkbookStream};
