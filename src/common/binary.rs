//! Binary data parsing utilities shared by the container engine.
//!
//! Everything in the compound file format is little-endian; these helpers
//! read fixed-width integers and UTF-16LE names out of untrusted byte slices
//! without panicking on short input.

use zerocopy::{FromBytes, LE, U32};

/// Binary parsing error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    InsufficientData { expected: usize, available: usize },
}

impl std::fmt::Display for BinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryError::InsufficientData {
                expected,
                available,
            } => {
                write!(
                    f,
                    "Insufficient data: expected {}, got {}",
                    expected, available
                )
            },
        }
    }
}

impl std::error::Error for BinaryError {}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use excelibur::common::binary::read_u32_le;
/// let data = [0x78, 0x56, 0x34, 0x12];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 0x12345678);
/// assert!(read_u32_le(&data, 1).is_err());
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    let end = offset.checked_add(4).unwrap_or(usize::MAX);
    let bytes = data
        .get(offset..end)
        .ok_or(BinaryError::InsufficientData {
            expected: end,
            available: data.len(),
        })?;
    U32::<LE>::read_from_bytes(bytes)
        .map(|v| v.get())
        .map_err(|_| BinaryError::InsufficientData {
            expected: end,
            available: data.len(),
        })
}

/// Iterate over a byte slice as consecutive little-endian u32 values.
///
/// Trailing bytes that do not fill a whole u32 are ignored.
#[inline]
pub fn u32_entries(data: &[u8]) -> impl Iterator<Item = u32> + '_ {
    data.chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

/// Decode a UTF-16LE string, stopping at the first NUL code unit.
///
/// Unpaired surrogates are replaced with U+FFFD rather than rejected; names
/// are only ever compared, never written back.
pub fn utf16le_until_nul(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}
