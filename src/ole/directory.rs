//! Directory stream decoding
//!
//! The directory is a regular stream of fixed 128-byte records. Records are
//! decoded in order into a flat list whose positions are the entry ids
//! (SIDs) used by sibling and child links. Unused records are kept so those
//! positions stay valid.

use super::clsid::Clsid;
use super::consts::*;
use super::error::{OleError, OleResult};
use super::fat::AllocationTable;
use super::header::Header;
use super::sector::SectorStore;
use crate::common::binary::utf16le_until_nul;
use chrono::{DateTime, Utc};
use fixedbitset::FixedBitSet;
use tracing::{debug, warn};
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw directory entry structure (128 bytes)
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE (64 bytes, null-padded)
    name: [u8; DIRENTRY_NAME_UNITS * 2],
    /// Length of name in bytes (including null terminator); not trusted
    #[allow(dead_code)]
    name_len: U16<LE>,
    /// Object type tag
    entry_type: u8,
    /// Node color (0 = red, 1 = black)
    node_color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    state_bits: U32<LE>,
    /// Creation time (FILETIME)
    creation_time: U64<LE>,
    /// Modified time (FILETIME)
    modified_time: U64<LE>,
    start_sector: U32<LE>,
    stream_size: U64<LE>,
}

/// Object type of a directory entry, decoded once at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// Free record
    Unused,
    /// Storage (folder)
    Storage,
    /// Stream (file)
    Stream,
    /// ILockBytes object
    LockBytes,
    /// IPropertyStorage object
    Property,
    /// The root storage, owner of the mini stream
    RootStorage,
    /// Any tag outside the defined range
    Unknown(u8),
}

impl From<u8> for ObjectType {
    fn from(tag: u8) -> Self {
        match tag {
            STGTY_EMPTY => ObjectType::Unused,
            STGTY_STORAGE => ObjectType::Storage,
            STGTY_STREAM => ObjectType::Stream,
            STGTY_LOCKBYTES => ObjectType::LockBytes,
            STGTY_PROPERTY => ObjectType::Property,
            STGTY_ROOT => ObjectType::RootStorage,
            other => ObjectType::Unknown(other),
        }
    }
}

/// Red-black tree node color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeColor {
    Red,
    Black,
}

impl From<u8> for NodeColor {
    fn from(value: u8) -> Self {
        if value == 0 {
            NodeColor::Red
        } else {
            NodeColor::Black
        }
    }
}

/// Represents one directory entry (stream, storage or root)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Storage ID (index in directory)
    pub sid: u32,
    /// Entry name, decoded up to the first NUL
    pub name: String,
    /// Decoded object type
    pub object_type: ObjectType,
    /// Red-black tree color
    pub color: NodeColor,
    /// Index of left sibling in red-black tree
    pub sid_left: u32,
    /// Index of right sibling in red-black tree
    pub sid_right: u32,
    /// Index of child node in red-black tree
    pub sid_child: u32,
    /// CLSID of this entry
    pub clsid: Clsid,
    /// User-defined state bits
    pub state_bits: u32,
    /// Creation time as a raw FILETIME
    pub creation_time: u64,
    /// Modification time as a raw FILETIME
    pub modified_time: u64,
    /// First sector of the stream (regular or mini, depending on size)
    pub start_sector: u32,
    /// Declared size of the stream in bytes
    pub size: u64,
}

impl DirectoryEntry {
    /// Parse a single directory entry from 128 bytes
    ///
    /// With `low_size_only`, the high dword of the stream size is ignored
    /// (it is undefined in files with 512-byte sectors).
    pub fn parse(data: &[u8], sid: u32, low_size_only: bool) -> OleResult<Self> {
        let raw = RawDirectoryEntry::read_from_bytes(data).map_err(|_| {
            OleError::corrupt(format!(
                "Directory entry {} is {} bytes, expected {}",
                sid,
                data.len(),
                DIRENTRY_SIZE
            ))
        })?;

        let size = if low_size_only {
            raw.stream_size.get() & 0xFFFF_FFFF
        } else {
            raw.stream_size.get()
        };

        Ok(DirectoryEntry {
            sid,
            name: utf16le_until_nul(&raw.name),
            object_type: ObjectType::from(raw.entry_type),
            color: NodeColor::from(raw.node_color),
            sid_left: raw.sid_left.get(),
            sid_right: raw.sid_right.get(),
            sid_child: raw.sid_child.get(),
            clsid: Clsid(raw.clsid),
            state_bits: raw.state_bits.get(),
            creation_time: raw.creation_time.get(),
            modified_time: raw.modified_time.get(),
            start_sector: raw.start_sector.get(),
            size,
        })
    }

    #[inline]
    pub fn is_stream(&self) -> bool {
        self.object_type == ObjectType::Stream
    }

    #[inline]
    pub fn is_storage(&self) -> bool {
        matches!(
            self.object_type,
            ObjectType::Storage | ObjectType::RootStorage
        )
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.object_type == ObjectType::RootStorage
    }

    /// Case-insensitive exact comparison against `name`
    pub fn name_matches(&self, name: &str) -> bool {
        self.name
            .chars()
            .flat_map(char::to_lowercase)
            .eq(name.chars().flat_map(char::to_lowercase))
    }

    /// Creation time, if set
    pub fn created(&self) -> Option<DateTime<Utc>> {
        filetime_to_datetime(self.creation_time)
    }

    /// Last modification time, if set
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        filetime_to_datetime(self.modified_time)
    }
}

/// Convert a FILETIME (100ns ticks since 1601-01-01) to UTC; zero means unset.
pub fn filetime_to_datetime(filetime: u64) -> Option<DateTime<Utc>> {
    if filetime == 0 {
        return None;
    }
    let ticks = filetime as i128 - FILETIME_UNIX_EPOCH_DIFF as i128;
    let secs = ticks.div_euclid(10_000_000) as i64;
    let nanos = (ticks.rem_euclid(10_000_000) * 100) as u32;
    DateTime::<Utc>::from_timestamp(secs, nanos)
}

/// Flat list of directory entries plus the position of the root storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
    root: usize,
}

impl Directory {
    /// Decode a concatenated directory stream.
    ///
    /// Records are read until fewer than 128 bytes remain. The first record
    /// typed as root storage becomes the root; the entry's name plays no part.
    pub fn parse(stream: &[u8], low_size_only: bool) -> OleResult<Self> {
        let entries = stream
            .chunks_exact(DIRENTRY_SIZE)
            .enumerate()
            .map(|(sid, record)| DirectoryEntry::parse(record, sid as u32, low_size_only))
            .collect::<OleResult<Vec<_>>>()?;

        let mut roots = entries.iter().filter(|entry| entry.is_root());
        let root = roots.next().ok_or(OleError::MissingRootStorage)?.sid as usize;
        let extra_roots = roots.count();
        if extra_roots > 0 {
            warn!(
                root,
                extra_roots, "multiple root storage entries, using the first"
            );
        }

        debug!(entries = entries.len(), root, "decoded directory");
        Ok(Self { entries, root })
    }

    /// Read the directory chain from the file and decode it.
    ///
    /// The chain must end on `ENDOFCHAIN`; a broken directory chain would
    /// silently drop entries.
    pub fn load(
        store: &SectorStore<'_>,
        fat: &AllocationTable,
        header: &Header,
    ) -> OleResult<Self> {
        let sectors = fat.walk_complete(header.first_dir_sector, "Directory")?;
        let mut stream = Vec::with_capacity(store.reserve_len(sectors.len()));
        for sector in sectors {
            stream.extend_from_slice(store.sector(sector)?);
        }
        Self::parse(&stream, header.has_32bit_stream_sizes())
    }

    /// The root storage entry
    #[inline]
    pub fn root(&self) -> &DirectoryEntry {
        &self.entries[self.root]
    }

    /// All entries, indexed by SID
    #[inline]
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry with the given SID
    #[inline]
    pub fn get(&self, sid: u32) -> Option<&DirectoryEntry> {
        self.entries.get(sid as usize)
    }

    /// First stream entry whose name matches case-insensitively.
    ///
    /// Unused records, storages and the root never match.
    pub fn find_stream(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries
            .iter()
            .find(|entry| entry.is_stream() && entry.name_matches(name))
    }

    /// SIDs of the children of `parent`, in tree (sorted) order.
    pub fn children(&self, parent: u32) -> OleResult<Vec<u32>> {
        let mut visited = FixedBitSet::with_capacity(self.entries.len());
        if (parent as usize) < self.entries.len() {
            visited.insert(parent as usize);
        }
        self.collect_children(parent, &mut visited)
    }

    /// Paths of every stream reachable from the root, storages first-to-last
    /// in tree order.
    pub fn stream_paths(&self) -> OleResult<Vec<Vec<String>>> {
        let mut visited = FixedBitSet::with_capacity(self.entries.len());
        visited.insert(self.root);
        let mut streams = Vec::new();
        let mut pending = vec![(self.root as u32, Vec::new())];

        while let Some((storage, path)) = pending.pop() {
            let mut nested = Vec::new();
            for sid in self.collect_children(storage, &mut visited)? {
                let entry = &self.entries[sid as usize];
                let mut entry_path = path.clone();
                entry_path.push(entry.name.clone());
                if entry.is_stream() {
                    streams.push(entry_path);
                } else if entry.is_storage() {
                    nested.push((sid, entry_path));
                }
            }
            // Keep sibling order when popping
            pending.extend(nested.into_iter().rev());
        }

        Ok(streams)
    }

    /// In-order walk of the red-black tree hanging off `parent`.
    ///
    /// `visited` is shared across calls so a SID reachable from two places is
    /// reported as corruption instead of being walked twice.
    fn collect_children(&self, parent: u32, visited: &mut FixedBitSet) -> OleResult<Vec<u32>> {
        let entry = self.get(parent).ok_or_else(|| {
            OleError::corrupt(format!("Directory entry {} does not exist", parent))
        })?;

        let mut children = Vec::new();
        let mut stack = Vec::new();
        let mut node = entry.sid_child;

        loop {
            while node != NOSTREAM {
                let current = self.get(node).ok_or_else(|| {
                    OleError::corrupt(format!(
                        "Directory link to entry {} beyond {} entries",
                        node,
                        self.entries.len()
                    ))
                })?;
                if visited.put(node as usize) {
                    return Err(OleError::corrupt(format!(
                        "Directory entry {} is linked more than once",
                        node
                    )));
                }
                stack.push(node);
                node = current.sid_left;
            }
            match stack.pop() {
                Some(sid) => {
                    children.push(sid);
                    node = self.entries[sid as usize].sid_right;
                },
                None => break,
            }
        }

        Ok(children)
    }
}
