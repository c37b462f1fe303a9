//! Compound file header decoding
//!
//! The header is a fixed 512-byte little-endian preamble. It is decoded in one
//! shot through a `zerocopy` view and then resolved into plain integers.

use super::clsid::Clsid;
use super::consts::*;
use super::error::{OleError, OleResult};
use tracing::debug;
use zerocopy::{FromBytes, LE, U16, U32};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw on-disk header (512 bytes)
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawHeader {
    /// Magic signature
    magic: [u8; 8],
    /// Reserved class id, normally zero
    clsid: [u8; 16],
    minor_version: U16<LE>,
    major_version: U16<LE>,
    /// 0xFFFE for little-endian
    byte_order: U16<LE>,
    sector_shift: U16<LE>,
    mini_sector_shift: U16<LE>,
    #[allow(dead_code)]
    reserved: [u8; 6],
    /// Directory sector count (always 0 for 512-byte sectors)
    num_dir_sectors: U32<LE>,
    num_fat_sectors: U32<LE>,
    first_dir_sector: U32<LE>,
    transaction_signature: U32<LE>,
    /// Streams strictly smaller than this live in the mini stream
    mini_stream_cutoff: U32<LE>,
    first_minifat_sector: U32<LE>,
    num_minifat_sectors: U32<LE>,
    first_difat_sector: U32<LE>,
    num_difat_sectors: U32<LE>,
    /// First 109 FAT sector indexes
    difat: [U32<LE>; HEADER_DIFAT_SLOTS],
}

/// Decoded compound file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Header class id
    pub clsid: Clsid,
    /// Format minor version (usually 0x003E)
    pub minor_version: u16,
    /// Format major version (3 or 4)
    pub major_version: u16,
    /// Byte-order marker
    pub byte_order: u16,
    /// Sector size exponent
    pub sector_shift: u16,
    /// Mini sector size exponent
    pub mini_sector_shift: u16,
    /// `1 << sector_shift`
    pub sector_size: usize,
    /// `1 << mini_sector_shift`
    pub mini_sector_size: usize,
    /// Number of directory sectors
    pub num_dir_sectors: u32,
    /// Number of FAT sectors
    pub num_fat_sectors: u32,
    /// First sector of the directory stream
    pub first_dir_sector: u32,
    /// Transaction signature
    pub transaction_signature: u32,
    /// Mini stream cutoff size (typically 4096 bytes)
    pub mini_stream_cutoff: u32,
    /// First sector of the MiniFAT
    pub first_minifat_sector: u32,
    /// Number of MiniFAT sectors
    pub num_minifat_sectors: u32,
    /// First DIFAT extension sector
    pub first_difat_sector: u32,
    /// Number of DIFAT extension sectors
    pub num_difat_sectors: u32,
    /// Inline DIFAT slots, in header order
    pub difat: [u32; HEADER_DIFAT_SLOTS],
}

impl Header {
    /// Decode and validate the header at the start of `data`.
    ///
    /// Only the length, the signature and the two size exponents are
    /// checked here; sector indices are validated by the stages that use them.
    pub fn parse(data: &[u8]) -> OleResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(OleError::TruncatedInput {
                expected: HEADER_SIZE,
                available: data.len(),
            });
        }

        let raw = RawHeader::read_from_bytes(&data[..HEADER_SIZE]).map_err(|_| {
            OleError::TruncatedInput {
                expected: HEADER_SIZE,
                available: data.len(),
            }
        })?;

        if &raw.magic != MAGIC {
            return Err(OleError::InvalidSignature);
        }

        let sector_shift = raw.sector_shift.get();
        let mini_sector_shift = raw.mini_sector_shift.get();
        if !(MIN_SECTOR_SHIFT..=MAX_SECTOR_SHIFT).contains(&sector_shift) {
            return Err(OleError::corrupt(format!(
                "Sector shift {} out of range",
                sector_shift
            )));
        }
        if mini_sector_shift == 0 || mini_sector_shift > sector_shift {
            return Err(OleError::corrupt(format!(
                "Mini sector shift {} out of range",
                mini_sector_shift
            )));
        }

        let header = Header {
            clsid: Clsid(raw.clsid),
            minor_version: raw.minor_version.get(),
            major_version: raw.major_version.get(),
            byte_order: raw.byte_order.get(),
            sector_shift,
            mini_sector_shift,
            sector_size: 1usize << sector_shift,
            mini_sector_size: 1usize << mini_sector_shift,
            num_dir_sectors: raw.num_dir_sectors.get(),
            num_fat_sectors: raw.num_fat_sectors.get(),
            first_dir_sector: raw.first_dir_sector.get(),
            transaction_signature: raw.transaction_signature.get(),
            mini_stream_cutoff: raw.mini_stream_cutoff.get(),
            first_minifat_sector: raw.first_minifat_sector.get(),
            num_minifat_sectors: raw.num_minifat_sectors.get(),
            first_difat_sector: raw.first_difat_sector.get(),
            num_difat_sectors: raw.num_difat_sectors.get(),
            difat: raw.difat.map(|slot| slot.get()),
        };

        debug!(
            major_version = header.major_version,
            sector_size = header.sector_size,
            mini_sector_size = header.mini_sector_size,
            mini_stream_cutoff = header.mini_stream_cutoff,
            num_fat_sectors = header.num_fat_sectors,
            num_difat_sectors = header.num_difat_sectors,
            "decoded compound file header"
        );

        Ok(header)
    }

    /// Fail unless the byte-order marker declares little-endian data.
    pub fn check_byte_order(&self) -> OleResult<()> {
        if self.byte_order != BYTE_ORDER_LE {
            return Err(OleError::corrupt(format!(
                "Invalid byte order marker 0x{:04X}",
                self.byte_order
            )));
        }
        Ok(())
    }

    /// Byte offset where sector 0 starts.
    ///
    /// The header always occupies the first 512 bytes; with sectors larger
    /// than that it is padded out to a whole sector.
    #[inline]
    pub fn sector_base(&self) -> usize {
        self.sector_size.max(HEADER_SIZE)
    }

    /// Whether stream sizes carry only 32 significant bits (512-byte sectors).
    #[inline]
    pub fn has_32bit_stream_sizes(&self) -> bool {
        self.sector_size == SECTOR_SIZE_V3
    }
}
