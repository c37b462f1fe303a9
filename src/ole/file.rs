//! Compound file parsing and stream resolution
//!
//! Parsing is one synchronous pass over an immutable buffer:
//! header, FAT, directory, then the MiniFAT and mini stream when present.
//! Named streams are resolved afterwards against those read-only tables.

use super::consts::*;
use super::directory::{Directory, DirectoryEntry};
use super::error::{OleError, OleResult};
use super::fat::{AllocationTable, build_fat};
use super::header::Header;
use super::minifat::MiniStream;
use super::options::ParseOptions;
use super::sector::SectorStore;
use super::workbook::WorkbookStream;
use bytes::Bytes;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// A parsed compound container held entirely in memory.
///
/// All tables are derived once at parse time and never mutated, so a
/// `CompoundFile` can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct CompoundFile {
    /// Raw input
    data: Bytes,
    /// Decoded header
    header: Header,
    /// File Allocation Table - maps sector to next sector in chain
    fat: AllocationTable,
    /// All directory entries indexed by SID
    directory: Directory,
    /// MiniFAT and mini stream, when the file declares a MiniFAT
    mini: Option<MiniStream>,
}

impl CompoundFile {
    /// Parse a container with default options.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use excelibur::ole::CompoundFile;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let data = std::fs::read("report.xls")?;
    /// let file = CompoundFile::parse(data)?;
    /// let workbook = file.resolve("Workbook")?;
    /// println!("Workbook stream: {} bytes", workbook.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse(data: impl Into<Bytes>) -> OleResult<Self> {
        Self::parse_with_options(data, &ParseOptions::default())
    }

    /// Parse a container with explicit options.
    pub fn parse_with_options(data: impl Into<Bytes>, options: &ParseOptions) -> OleResult<Self> {
        let data: Bytes = data.into();

        if let Some(limit) = options.max_input_len
            && data.len() > limit
        {
            return Err(OleError::InputTooLarge {
                limit,
                actual: data.len(),
            });
        }

        let header = Header::parse(&data)?;
        if options.verify_byte_order {
            header.check_byte_order()?;
        }

        let store = SectorStore::new(&data, &header);
        let fat = build_fat(&store, &header)?;
        let directory = Directory::load(&store, &fat, &header)?;
        let mini = MiniStream::load(&store, &fat, &header, directory.root())?;

        debug!(
            input_len = data.len(),
            sectors = store.sector_count(),
            entries = directory.len(),
            mini_stream = mini.is_some(),
            "parsed compound file"
        );

        Ok(Self {
            data,
            header,
            fat,
            directory,
            mini,
        })
    }

    /// Read a whole file into memory and parse it.
    pub fn open<P: AsRef<Path>>(path: P) -> OleResult<Self> {
        Self::open_with_options(path, &ParseOptions::default())
    }

    /// Read a whole file into memory and parse it with explicit options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &ParseOptions) -> OleResult<Self> {
        let file = File::open(path)?;
        Self::from_reader_with_options(file, options)
    }

    /// Drain a reader into memory and parse the result.
    pub fn from_reader<R: Read>(reader: R) -> OleResult<Self> {
        Self::from_reader_with_options(reader, &ParseOptions::default())
    }

    /// Drain a reader into memory and parse it with explicit options.
    ///
    /// With a size limit configured, at most one byte past the limit is read
    /// before the input is rejected.
    pub fn from_reader_with_options<R: Read>(reader: R, options: &ParseOptions) -> OleResult<Self> {
        let mut buffer = Vec::new();
        match options.max_input_len {
            Some(limit) => {
                let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
                reader.take(cap).read_to_end(&mut buffer)?;
            },
            None => {
                let mut reader = reader;
                reader.read_to_end(&mut buffer)?;
            },
        }
        Self::parse_with_options(buffer, options)
    }

    /// Size of the input in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decoded header
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Regular allocation table
    #[inline]
    pub fn fat(&self) -> &AllocationTable {
        &self.fat
    }

    /// Decoded directory
    #[inline]
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// All directory entries, indexed by SID
    #[inline]
    pub fn entries(&self) -> &[DirectoryEntry] {
        self.directory.entries()
    }

    /// The root storage entry
    #[inline]
    pub fn root(&self) -> &DirectoryEntry {
        self.directory.root()
    }

    /// MiniFAT and mini stream, if the file has them
    #[inline]
    pub fn mini_stream(&self) -> Option<&MiniStream> {
        self.mini.as_ref()
    }

    /// Paths of all streams reachable from the root storage
    pub fn list_streams(&self) -> OleResult<Vec<Vec<String>>> {
        self.directory.stream_paths()
    }

    /// Find a stream entry by case-insensitive name
    pub fn entry(&self, name: &str) -> OleResult<&DirectoryEntry> {
        self.directory
            .find_stream(name)
            .ok_or_else(|| OleError::StreamNotFound(name.to_string()))
    }

    /// Check if a stream exists
    pub fn exists(&self, name: &str) -> bool {
        self.directory.find_stream(name).is_some()
    }

    /// Whether `entry` is stored in the mini stream rather than in regular sectors
    #[inline]
    pub fn uses_mini_stream(&self, entry: &DirectoryEntry) -> bool {
        entry.size < u64::from(self.header.mini_stream_cutoff)
    }

    /// Return the contents of the stream called `name`.
    ///
    /// The lookup is case-insensitive and the first matching stream entry
    /// wins. The result is exactly the declared stream size.
    pub fn resolve(&self, name: &str) -> OleResult<Vec<u8>> {
        let entry = self.entry(name)?;
        self.read_entry(entry)
    }

    /// Return the contents of a stream entry.
    ///
    /// Streams below the mini stream cutoff are read through the MiniFAT,
    /// larger ones through the FAT. The assembled bytes are truncated to the
    /// declared size; a chain that holds fewer bytes than declared is
    /// reported as corruption.
    pub fn read_entry(&self, entry: &DirectoryEntry) -> OleResult<Vec<u8>> {
        let declared = usize::try_from(entry.size).map_err(|_| {
            OleError::corrupt(format!(
                "Stream '{}' declares {} bytes, more than addressable",
                entry.name, entry.size
            ))
        })?;
        if declared == 0 {
            return Ok(Vec::new());
        }

        let mut data = if self.uses_mini_stream(entry) {
            let mini = self.mini.as_ref().ok_or_else(|| {
                OleError::corrupt(format!(
                    "Stream '{}' ({} bytes) lives in the mini stream but the file has no MiniFAT",
                    entry.name, entry.size
                ))
            })?;
            debug!(
                stream = %entry.name,
                size = entry.size,
                start = entry.start_sector,
                "resolving through MiniFAT"
            );
            mini.read_chain(entry.start_sector)?
        } else {
            debug!(
                stream = %entry.name,
                size = entry.size,
                start = entry.start_sector,
                "resolving through FAT"
            );
            self.read_regular_chain(entry.start_sector)?
        };

        if data.len() < declared {
            return Err(OleError::corrupt(format!(
                "Stream '{}' (entry {}) declares {} bytes but its chain from sector {} holds only {}",
                entry.name,
                entry.sid,
                declared,
                entry.start_sector,
                data.len()
            )));
        }
        data.truncate(declared);
        Ok(data)
    }

    /// Locate the workbook stream, trying "Workbook" then "Book".
    ///
    /// Only a missing "Workbook" triggers the second probe; any other error
    /// is returned as is. Failure of the second probe is final.
    pub fn workbook_stream(&self) -> OleResult<WorkbookStream> {
        let mut last_err = None;
        for name in WORKBOOK_STREAM_NAMES {
            match self.resolve(name) {
                Ok(data) => return Ok(WorkbookStream { name, data }),
                Err(OleError::StreamNotFound(missing)) => {
                    debug!(stream = %missing, "workbook stream probe missed");
                    last_err = Some(OleError::StreamNotFound(missing));
                },
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| OleError::StreamNotFound(BOOK_STREAM.to_string())))
    }

    /// Concatenate the regular sectors of the chain starting at `start`.
    ///
    /// A chain that breaks early, or runs past the end of the file, yields
    /// whatever was read so far.
    fn read_regular_chain(&self, start: u32) -> OleResult<Vec<u8>> {
        let store = SectorStore::new(&self.data, &self.header);
        let chain = self.fat.walk(start)?;
        let mut out = Vec::with_capacity(store.reserve_len(chain.len()));
        for &sector in &chain.sectors {
            match store.sector(sector) {
                Ok(bytes) => out.extend_from_slice(bytes),
                Err(e) => {
                    warn!(sector, error = %e, "stream chain runs past the end of the file");
                    break;
                },
            }
        }
        Ok(out)
    }
}

/// Check if data looks like a compound file by its length and magic bytes
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE && &data[0..8] == MAGIC
}
