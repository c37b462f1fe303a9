//! Sector addressing over the raw input buffer.
//!
//! Regular sectors are addressed relative to the end of the header; mini
//! sectors are addressed relative to the start of the mini stream. A final
//! partial sector is returned short instead of being rejected.

use super::error::{OleError, OleResult};
use super::header::Header;
use std::ops::Range;

/// Byte range of sector `index` inside a buffer of `len` bytes.
///
/// The range starts at `base + index * size` and is clamped to `len`.
/// Returns `None` when the sector starts at or beyond the end of the buffer
/// (or the offset does not fit in `usize`).
#[inline]
pub fn sector_range(base: usize, index: u32, size: usize, len: usize) -> Option<Range<usize>> {
    let start = (index as usize)
        .checked_mul(size)
        .and_then(|offset| offset.checked_add(base))?;
    if start >= len {
        return None;
    }
    let end = start.saturating_add(size).min(len);
    Some(start..end)
}

/// Read-only view of the regular sectors of one container.
#[derive(Debug, Clone, Copy)]
pub struct SectorStore<'a> {
    data: &'a [u8],
    base: usize,
    sector_size: usize,
}

impl<'a> SectorStore<'a> {
    /// Create a view over `data` using the geometry declared by `header`
    pub fn new(data: &'a [u8], header: &Header) -> Self {
        Self {
            data,
            base: header.sector_base(),
            sector_size: header.sector_size,
        }
    }

    /// Size of one regular sector in bytes
    #[inline]
    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    /// Number of complete sectors present after the header
    pub fn sector_count(&self) -> usize {
        self.data.len().saturating_sub(self.base) / self.sector_size
    }

    /// Bytes to reserve for reading `sectors` sectors.
    ///
    /// Chain lengths come from the allocation table, which can name far more
    /// sectors than the file holds; the reservation never exceeds the input.
    #[inline]
    pub fn reserve_len(&self, sectors: usize) -> usize {
        sectors
            .min(self.sector_count() + 1)
            .saturating_mul(self.sector_size)
    }

    /// Contents of sector `index`; the last sector of the file may be short.
    pub fn sector(&self, index: u32) -> OleResult<&'a [u8]> {
        sector_range(self.base, index, self.sector_size, self.data.len())
            .map(|range| &self.data[range])
            .ok_or_else(|| {
                OleError::corrupt(format!(
                    "Sector {} lies beyond the end of the file ({} bytes)",
                    index,
                    self.data.len()
                ))
            })
    }

    /// Contents of sector `index`, which must be present in full.
    pub fn full_sector(&self, index: u32) -> OleResult<&'a [u8]> {
        let sector = self.sector(index)?;
        if sector.len() < self.sector_size {
            return Err(OleError::corrupt(format!(
                "Sector {} is truncated: {} of {} bytes present",
                index,
                sector.len(),
                self.sector_size
            )));
        }
        Ok(sector)
    }
}

/// Contents of mini sector `index` within `ministream`.
///
/// The final mini sector may be shorter than `mini_sector_size`.
#[inline]
pub fn mini_sector(ministream: &[u8], index: u32, mini_sector_size: usize) -> Option<&[u8]> {
    sector_range(0, index, mini_sector_size, ministream.len()).map(|range| &ministream[range])
}
