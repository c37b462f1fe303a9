//! Sector chain traversal with cycle and bounds protection.
//!
//! Allocation tables come straight from untrusted input, so a chain may point
//! outside the table or loop back on itself. Every walk tracks the sectors it
//! has already visited and is therefore bounded by the table length.

use super::consts::ENDOFCHAIN;
use super::error::{OleError, OleResult};
use fixedbitset::FixedBitSet;
use tracing::{trace, warn};

/// Ordered sector indices of one logical stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    /// Sector indices in stream order
    pub sectors: Vec<u32>,
    /// Whether the walk ended on `ENDOFCHAIN` rather than an out-of-range entry
    pub complete: bool,
}

impl Chain {
    /// Number of sectors in the chain
    #[inline]
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    /// Whether the chain holds no sectors
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}

/// Follow `table` from `start` until `ENDOFCHAIN`.
///
/// A start of `ENDOFCHAIN` is an empty, complete chain. A start outside the
/// table, or any entry pointing outside it (including the `FREESECT` and
/// `FATSECT` markers), ends the walk early with
/// `complete == false`. Revisiting a sector is reported as
/// [`OleError::CorruptStructure`].
pub fn walk(table: &[u32], start: u32) -> OleResult<Chain> {
    let len = table.len();
    if start == ENDOFCHAIN {
        return Ok(Chain {
            sectors: Vec::new(),
            complete: true,
        });
    }
    if start as usize >= len {
        trace!(start, table_len = len, "chain starts outside the table");
        return Ok(Chain::default());
    }

    let mut visited = FixedBitSet::with_capacity(len);
    let mut sectors = Vec::new();
    let mut current = start;

    loop {
        visited.insert(current as usize);
        sectors.push(current);

        let next = table[current as usize];
        if next == ENDOFCHAIN {
            trace!(start, sectors = sectors.len(), "chain complete");
            return Ok(Chain {
                sectors,
                complete: true,
            });
        }
        if next as usize >= len {
            warn!(
                start,
                at = current,
                next,
                "chain terminated by an out-of-range entry"
            );
            return Ok(Chain {
                sectors,
                complete: false,
            });
        }
        if visited.contains(next as usize) {
            return Err(OleError::corrupt(format!(
                "Cycle in sector chain starting at {}: sector {} points back to {}",
                start, current, next
            )));
        }
        current = next;
    }
}

/// Like [`walk`], but a chain that does not end on `ENDOFCHAIN` is an error.
///
/// Used for structural streams (directory, MiniFAT) where a short read would
/// silently drop entries.
pub fn walk_complete(table: &[u32], start: u32, what: &str) -> OleResult<Vec<u32>> {
    let chain = walk(table, start)?;
    if !chain.complete {
        let last = chain.sectors.last().copied().unwrap_or(start);
        return Err(OleError::corrupt(format!(
            "{} chain starting at {} is broken after sector {}",
            what, start, last
        )));
    }
    Ok(chain.sectors)
}
