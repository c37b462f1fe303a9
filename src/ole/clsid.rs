//! Class identifiers embedded in the header and in directory entries.

use std::fmt;

/// A 16-byte class identifier, stored in its on-disk (mixed-endian) layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Clsid(pub [u8; 16]);

impl Clsid {
    /// Whether every byte is zero (no class associated)
    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

/// Formats as `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}`; the null CLSID formats
/// as an empty string.
impl fmt::Display for Clsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return Ok(());
        }
        let b = &self.0;
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
            u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            u16::from_le_bytes([b[4], b[5]]),
            u16::from_le_bytes([b[6], b[7]]),
            b[8],
            b[9],
            b[10],
            b[11],
            b[12],
            b[13],
            b[14],
            b[15],
        )
    }
}
