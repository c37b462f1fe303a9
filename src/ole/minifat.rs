//! MiniFAT and mini stream loading
//!
//! Streams below the header's cutoff are stored in 64-byte mini sectors
//! inside the mini stream, which is itself the root entry's regular stream.
//! The MiniFAT chains those mini sectors together.

use super::directory::DirectoryEntry;
use super::error::OleResult;
use super::fat::AllocationTable;
use super::header::Header;
use super::sector::{SectorStore, mini_sector};
use tracing::{debug, warn};

/// MiniFAT plus the mini stream it addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiniStream {
    table: AllocationTable,
    data: Vec<u8>,
    mini_sector_size: usize,
}

impl MiniStream {
    /// Load the MiniFAT and the mini stream.
    ///
    /// Returns `Ok(None)` when the header declares no MiniFAT sectors; the
    /// mini path is then unavailable. The MiniFAT chain itself must be
    /// complete. The mini stream is assembled from the root entry's regular
    /// chain and truncated to the root's declared size.
    pub fn load(
        store: &SectorStore<'_>,
        fat: &AllocationTable,
        header: &Header,
        root: &DirectoryEntry,
    ) -> OleResult<Option<Self>> {
        if header.num_minifat_sectors == 0 {
            debug!("no MiniFAT sectors declared, mini stream unavailable");
            return Ok(None);
        }

        let minifat_sectors = fat.walk_complete(header.first_minifat_sector, "MiniFAT")?;
        let mut minifat_data = Vec::with_capacity(store.reserve_len(minifat_sectors.len()));
        for sector in minifat_sectors {
            minifat_data.extend_from_slice(store.sector(sector)?);
        }
        let table = AllocationTable::from_bytes(&minifat_data);

        let chain = fat.walk(root.start_sector)?;
        let mut data = Vec::with_capacity(store.reserve_len(chain.len()));
        for &sector in &chain.sectors {
            data.extend_from_slice(store.sector(sector)?);
        }
        let declared = usize::try_from(root.size).unwrap_or(usize::MAX);
        if data.len() < declared {
            warn!(
                declared = root.size,
                available = data.len(),
                "mini stream shorter than the root entry declares"
            );
        }
        data.truncate(declared);

        debug!(
            minifat_entries = table.len(),
            ministream_len = data.len(),
            "loaded mini stream"
        );

        Ok(Some(Self {
            table,
            data,
            mini_sector_size: header.mini_sector_size,
        }))
    }

    /// Build directly from a decoded MiniFAT and mini stream bytes
    pub fn from_parts(table: AllocationTable, data: Vec<u8>, mini_sector_size: usize) -> Self {
        Self {
            table,
            data,
            mini_sector_size,
        }
    }

    /// The MiniFAT
    #[inline]
    pub fn table(&self) -> &AllocationTable {
        &self.table
    }

    /// Raw mini stream bytes
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn mini_sector_size(&self) -> usize {
        self.mini_sector_size
    }

    /// Number of mini sectors, counting a short final one
    pub fn mini_sector_count(&self) -> usize {
        self.data.len().div_ceil(self.mini_sector_size)
    }

    /// Contents of mini sector `index`; the last one may be short
    #[inline]
    pub fn mini_sector(&self, index: u32) -> Option<&[u8]> {
        mini_sector(&self.data, index, self.mini_sector_size)
    }

    /// Concatenate the mini sectors of the MiniFAT chain starting at `start`.
    ///
    /// Like regular stream assembly this tolerates a short chain; a chain
    /// entry beyond the end of the mini stream also ends the read.
    pub fn read_chain(&self, start: u32) -> OleResult<Vec<u8>> {
        let chain = self.table.walk(start)?;
        let reserve = chain.len().min(self.mini_sector_count()) * self.mini_sector_size;
        let mut out = Vec::with_capacity(reserve);
        for &index in &chain.sectors {
            match self.mini_sector(index) {
                Some(bytes) => out.extend_from_slice(bytes),
                None => {
                    warn!(
                        mini_sector = index,
                        ministream_len = self.data.len(),
                        "mini sector beyond the mini stream"
                    );
                    break;
                },
            }
        }
        Ok(out)
    }
}
