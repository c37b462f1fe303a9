//! FAT (File Allocation Table) loading
//!
//! The FAT maps every regular sector to the next sector of its stream. Its own
//! sectors are listed by the DIFAT: the first 109 indices sit inline in the
//! header, the rest in a chain of DIFAT extension sectors.

use super::chain::{self, Chain};
use super::consts::*;
use super::error::{OleError, OleResult};
use super::header::Header;
use super::sector::SectorStore;
use crate::common::binary::{read_u32_le, u32_entries};
use fixedbitset::FixedBitSet;
use tracing::{debug, warn};

/// Sector allocation table: one entry per (mini) sector, either the next
/// index of the chain or one of the sentinels from [`consts`](super::consts).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationTable {
    entries: Vec<u32>,
}

impl AllocationTable {
    /// Wrap already decoded entries
    pub fn from_entries(entries: Vec<u32>) -> Self {
        Self { entries }
    }

    /// Decode a byte buffer as consecutive little-endian entries
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            entries: u32_entries(data).collect(),
        }
    }

    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for sector `index`
    #[inline]
    pub fn get(&self, index: u32) -> Option<u32> {
        self.entries.get(index as usize).copied()
    }

    /// All entries in sector order
    #[inline]
    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    /// Walk the chain starting at `start`, see [`chain::walk`]
    pub fn walk(&self, start: u32) -> OleResult<Chain> {
        chain::walk(&self.entries, start)
    }

    /// Walk a chain that must end on `ENDOFCHAIN`, see [`chain::walk_complete`]
    pub fn walk_complete(&self, start: u32, what: &str) -> OleResult<Vec<u32>> {
        chain::walk_complete(&self.entries, start, what)
    }
}

/// Collect the indices of every FAT sector, in DIFAT order.
///
/// Slots holding `FREESECT`, or any other marker above `MAXREGSECT`, are
/// skipped without disturbing the order of later slots. When the header declares DIFAT extension
/// sectors, that chain is followed for at most the declared count; each
/// extension sector holds `sector_size / 4 - 1` indices followed by the index
/// of the next extension sector.
pub fn fat_sector_ids(store: &SectorStore<'_>, header: &Header) -> OleResult<Vec<u32>> {
    let mut ids: Vec<u32> = header
        .difat
        .iter()
        .copied()
        .filter(|&slot| slot <= MAXREGSECT)
        .collect();

    if header.num_difat_sectors == 0 {
        return Ok(ids);
    }

    let ids_per_sector = store.sector_size() / 4 - 1;
    let mut visited = FixedBitSet::with_capacity(store.sector_count());
    let mut difat_sector = header.first_difat_sector;

    for n in 0..header.num_difat_sectors {
        if difat_sector == ENDOFCHAIN || difat_sector == FREESECT {
            warn!(
                declared = header.num_difat_sectors,
                found = n,
                "DIFAT chain shorter than declared"
            );
            break;
        }

        let data = store.full_sector(difat_sector).map_err(|e| {
            OleError::corrupt(format!("DIFAT sector {} unreadable: {}", difat_sector, e))
        })?;
        if visited.put(difat_sector as usize) {
            return Err(OleError::corrupt(format!(
                "Cycle in DIFAT chain at sector {}",
                difat_sector
            )));
        }

        ids.extend(
            u32_entries(&data[..ids_per_sector * 4]).filter(|&sector| sector <= MAXREGSECT),
        );
        difat_sector = read_u32_le(data, ids_per_sector * 4)?;
    }

    Ok(ids)
}

/// Build the full FAT by concatenating every sector the DIFAT lists.
pub fn build_fat(store: &SectorStore<'_>, header: &Header) -> OleResult<AllocationTable> {
    let ids = fat_sector_ids(store, header)?;
    if ids.len() != header.num_fat_sectors as usize {
        debug!(
            declared = header.num_fat_sectors,
            found = ids.len(),
            "FAT sector count differs from header"
        );
    }

    // Every listed sector must be distinct and present, so a longer list is
    // corrupt before anything is read
    if ids.len() > store.sector_count() {
        return Err(OleError::corrupt(format!(
            "DIFAT lists {} FAT sectors but the file holds only {} sectors",
            ids.len(),
            store.sector_count()
        )));
    }

    let entries_per_sector = store.sector_size() / 4;
    let mut entries = Vec::with_capacity(ids.len() * entries_per_sector);
    let mut seen = FixedBitSet::with_capacity(store.sector_count());

    for (slot, &sector_id) in ids.iter().enumerate() {
        let data = store.full_sector(sector_id).map_err(|e| {
            OleError::corrupt(format!(
                "FAT sector {} (DIFAT slot {}) unreadable: {}",
                sector_id, slot, e
            ))
        })?;
        // A sector can only hold one slice of the FAT
        if seen.put(sector_id as usize) {
            return Err(OleError::corrupt(format!(
                "FAT sector {} listed more than once (DIFAT slot {})",
                sector_id, slot
            )));
        }
        entries.extend(u32_entries(data));
    }

    debug!(
        fat_sectors = ids.len(),
        entries = entries.len(),
        "loaded allocation table"
    );

    Ok(AllocationTable::from_entries(entries))
}
