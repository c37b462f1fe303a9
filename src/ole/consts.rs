//! Constants for the compound file binary format.
//!
//! Every format tag, sentinel and fixed size the container engine relies on is
//! defined here, once, and never mutated.

/// Magic bytes that should be at the beginning of every compound file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Size of the on-disk header, regardless of the declared sector size
pub const HEADER_SIZE: usize = 512;

/// Number of allocation-table sector indices stored inline in the header
pub const HEADER_DIFAT_SLOTS: usize = 109;

/// Byte offset of the first inline DIFAT slot inside the header
pub const HEADER_DIFAT_OFFSET: usize = 0x4C;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Maximum number of UTF-16 code units in a directory entry name
pub const DIRENTRY_NAME_UNITS: usize = 32;

/// Little-endian byte order marker
pub const BYTE_ORDER_LE: u16 = 0xFFFE;

/// Smallest accepted sector shift (128-byte sectors)
pub const MIN_SECTOR_SHIFT: u16 = 7;

/// Largest accepted sector shift (1 MiB sectors)
pub const MAX_SECTOR_SHIFT: u16 = 20;

/// Sector size used by major version 3 files
pub const SECTOR_SIZE_V3: usize = 512;

// Sector IDs (from MS-CFB)
/// Maximum regular sector ID
pub const MAXREGSECT: u32 = 0xFFFFFFFA; // -6
/// Denotes a FAT sector in a FAT
pub const FATSECT: u32 = 0xFFFFFFFD; // -3
/// End of a virtual stream chain
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE; // -2
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFFFFFF; // -1

/// Unallocated directory entry (no sibling / no child)
pub const NOSTREAM: u32 = 0xFFFFFFFF; // -1

// Object types in storage (from MS-CFB)
/// Empty directory entry
pub const STGTY_EMPTY: u8 = 0;
/// Element is a storage object
pub const STGTY_STORAGE: u8 = 1;
/// Element is a stream object
pub const STGTY_STREAM: u8 = 2;
/// Element is an ILockBytes object
pub const STGTY_LOCKBYTES: u8 = 3;
/// Element is an IPropertyStorage object
pub const STGTY_PROPERTY: u8 = 4;
/// Element is a root storage
pub const STGTY_ROOT: u8 = 5;

/// Stream holding BIFF8 workbook records
pub const WORKBOOK_STREAM: &str = "Workbook";

/// Stream holding BIFF5 and older workbook records
pub const BOOK_STREAM: &str = "Book";

/// Workbook stream names, in probe order
pub const WORKBOOK_STREAM_NAMES: [&str; 2] = [WORKBOOK_STREAM, BOOK_STREAM];

/// Difference between the FILETIME epoch (1601-01-01) and the Unix epoch, in 100ns ticks
pub const FILETIME_UNIX_EPOCH_DIFF: u64 = 116_444_736_000_000_000;
