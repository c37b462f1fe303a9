//! OLE2 compound file engine.
//!
//! Parses the fixed header, rebuilds the FAT from the DIFAT, decodes the
//! directory, loads the MiniFAT and mini stream, and reassembles named
//! streams from sector chains. Every chain walk is bounded and cycle-checked,
//! so a hostile file produces an error rather than a hang.

/// Constants for the compound file format
pub mod consts;

/// Class identifiers
mod clsid;

/// Error types for container parsing
mod error;

/// Parsing configuration
mod options;

/// Fixed 512-byte header decoding
mod header;

/// Sector addressing over the input buffer
mod sector;

/// Cycle-safe chain traversal
mod chain;

/// FAT and DIFAT loading
mod fat;

/// Directory stream decoding
mod directory;

/// MiniFAT and mini stream loading
mod minifat;

/// Container parsing and stream resolution
mod file;

/// Workbook stream hand-off to record decoders and document writers
mod workbook;

/// Synthetic containers for unit tests
#[cfg(test)]
pub(crate) mod testing;

// Re-export public types for convenient access
pub use chain::{Chain, walk, walk_complete};
pub use clsid::Clsid;
pub use directory::{Directory, DirectoryEntry, NodeColor, ObjectType, filetime_to_datetime};
pub use error::{OleError, OleResult};
pub use fat::{AllocationTable, build_fat, fat_sector_ids};
pub use file::{CompoundFile, is_ole_file};
pub use header::Header;
pub use minifat::MiniStream;
pub use options::ParseOptions;
pub use sector::{SectorStore, mini_sector, sector_range};
pub use workbook::{
    DocumentWriter, PassthroughDecoder, RawStreamWriter, RecordDecoder, WorkbookStream, convert,
};
