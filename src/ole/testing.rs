//! Synthetic container construction for unit tests.
//!
//! `ContainerBuilder` lays sectors out one by one and lets a test forge any
//! header field or allocation entry, which is how broken chains, cycles and
//! missing roots get exercised. `build_container` covers the common case of
//! a well-formed file holding a handful of named streams.

use super::consts::*;

/// Encode a 512-byte header with empty tables and the given geometry.
pub fn header_bytes(sector_shift: u16, mini_sector_shift: u16, cutoff: u32) -> Vec<u8> {
    let mut header = vec![0u8; HEADER_SIZE];
    header[0..8].copy_from_slice(MAGIC);
    header[0x18..0x1A].copy_from_slice(&0x003Eu16.to_le_bytes());
    let major: u16 = if sector_shift == 12 { 4 } else { 3 };
    header[0x1A..0x1C].copy_from_slice(&major.to_le_bytes());
    header[0x1C..0x1E].copy_from_slice(&BYTE_ORDER_LE.to_le_bytes());
    header[0x1E..0x20].copy_from_slice(&sector_shift.to_le_bytes());
    header[0x20..0x22].copy_from_slice(&mini_sector_shift.to_le_bytes());
    header[0x30..0x34].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
    header[0x38..0x3C].copy_from_slice(&cutoff.to_le_bytes());
    header[0x3C..0x40].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
    header[0x44..0x48].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
    for slot in 0..HEADER_DIFAT_SLOTS {
        let offset = HEADER_DIFAT_OFFSET + slot * 4;
        header[offset..offset + 4].copy_from_slice(&FREESECT.to_le_bytes());
    }
    header
}

/// One 128-byte directory record, with NOSTREAM links by default.
#[derive(Debug, Clone)]
pub struct EntryRecord {
    pub name: String,
    pub entry_type: u8,
    pub color: u8,
    pub left: u32,
    pub right: u32,
    pub child: u32,
    pub start: u32,
    pub size: u64,
}

impl EntryRecord {
    pub fn new(name: &str, entry_type: u8, start: u32, size: u64) -> Self {
        Self {
            name: name.to_string(),
            entry_type,
            color: 1,
            left: NOSTREAM,
            right: NOSTREAM,
            child: NOSTREAM,
            start,
            size,
        }
    }

    pub fn root(start: u32, size: u64) -> Self {
        Self::new("Root Entry", STGTY_ROOT, start, size)
    }

    pub fn stream(name: &str, start: u32, size: u64) -> Self {
        Self::new(name, STGTY_STREAM, start, size)
    }

    pub fn encode(&self) -> [u8; DIRENTRY_SIZE] {
        let mut raw = [0u8; DIRENTRY_SIZE];
        let units: Vec<u16> = self.name.encode_utf16().take(DIRENTRY_NAME_UNITS - 1).collect();
        for (i, unit) in units.iter().enumerate() {
            raw[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        let name_len = if units.is_empty() { 0 } else { (units.len() as u16 + 1) * 2 };
        raw[64..66].copy_from_slice(&name_len.to_le_bytes());
        raw[66] = self.entry_type;
        raw[67] = self.color;
        raw[68..72].copy_from_slice(&self.left.to_le_bytes());
        raw[72..76].copy_from_slice(&self.right.to_le_bytes());
        raw[76..80].copy_from_slice(&self.child.to_le_bytes());
        raw[116..120].copy_from_slice(&self.start.to_le_bytes());
        raw[120..128].copy_from_slice(&self.size.to_le_bytes());
        raw
    }
}

/// Sector-by-sector container assembler.
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    sector_shift: u16,
    mini_sector_shift: u16,
    cutoff: u32,
    sectors: Vec<Vec<u8>>,
    fat: Vec<u32>,
    difat: [u32; HEADER_DIFAT_SLOTS],
    num_fat_sectors: Option<u32>,
    first_dir_sector: u32,
    first_minifat_sector: u32,
    num_minifat_sectors: u32,
    first_difat_sector: u32,
    num_difat_sectors: u32,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    /// 512-byte sectors, 64-byte mini sectors, 4096-byte cutoff
    pub fn new() -> Self {
        Self::with_geometry(9, 6, 4096)
    }

    pub fn with_geometry(sector_shift: u16, mini_sector_shift: u16, cutoff: u32) -> Self {
        Self {
            sector_shift,
            mini_sector_shift,
            cutoff,
            sectors: Vec::new(),
            fat: Vec::new(),
            difat: [FREESECT; HEADER_DIFAT_SLOTS],
            num_fat_sectors: None,
            first_dir_sector: ENDOFCHAIN,
            first_minifat_sector: ENDOFCHAIN,
            num_minifat_sectors: 0,
            first_difat_sector: ENDOFCHAIN,
            num_difat_sectors: 0,
        }
    }

    pub fn sector_size(&self) -> usize {
        1 << self.sector_shift
    }

    pub fn sector_count(&self) -> u32 {
        self.sectors.len() as u32
    }

    /// Append one sector (zero padded) and return its index
    pub fn add_sector(&mut self, mut data: Vec<u8>) -> u32 {
        data.resize(self.sector_size(), 0);
        self.sectors.push(data);
        self.sectors.len() as u32 - 1
    }

    /// Append one sector holding little-endian u32 values
    pub fn add_u32_sector(&mut self, values: &[u32]) -> u32 {
        self.add_sector(values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }

    /// Overwrite the contents of an existing sector with u32 values
    pub fn write_u32s(&mut self, index: u32, values: &[u32]) {
        let mut data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        data.resize(self.sector_size(), 0);
        self.sectors[index as usize] = data;
    }

    /// Append `data` as a contiguous chain and record it in the FAT model.
    ///
    /// Returns the first sector, or `ENDOFCHAIN` for empty data.
    pub fn add_chain(&mut self, data: &[u8]) -> u32 {
        if data.is_empty() {
            return ENDOFCHAIN;
        }
        let chunks: Vec<Vec<u8>> = data.chunks(self.sector_size()).map(<[u8]>::to_vec).collect();
        let count = chunks.len();
        let start = self.sector_count();
        for (i, chunk) in chunks.into_iter().enumerate() {
            let index = self.add_sector(chunk);
            let next = if i + 1 < count { index + 1 } else { ENDOFCHAIN };
            self.set_fat_entry(index, next);
        }
        start
    }

    /// Force a FAT entry in the FAT model
    pub fn set_fat_entry(&mut self, index: u32, value: u32) {
        let index = index as usize;
        if self.fat.len() <= index {
            self.fat.resize(index + 1, FREESECT);
        }
        self.fat[index] = value;
    }

    /// Use `ids` as the leading inline DIFAT slots, the rest stay free
    pub fn set_fat_slots(&mut self, ids: &[u32]) {
        self.difat = [FREESECT; HEADER_DIFAT_SLOTS];
        self.difat[..ids.len()].copy_from_slice(ids);
    }

    /// Replace all 109 inline DIFAT slots verbatim
    pub fn set_raw_difat(&mut self, slots: [u32; HEADER_DIFAT_SLOTS]) {
        self.difat = slots;
    }

    pub fn set_difat_chain(&mut self, first: u32, count: u32) {
        self.first_difat_sector = first;
        self.num_difat_sectors = count;
    }

    pub fn set_directory_start(&mut self, first: u32) {
        self.first_dir_sector = first;
    }

    pub fn set_minifat(&mut self, first: u32, count: u32) {
        self.first_minifat_sector = first;
        self.num_minifat_sectors = count;
    }

    /// Store directory records as a chain and point the header at it
    pub fn add_directory(&mut self, entries: &[EntryRecord]) -> u32 {
        let mut stream: Vec<u8> = entries.iter().flat_map(|e| e.encode()).collect();
        let padded = stream.len().div_ceil(self.sector_size()) * self.sector_size();
        stream.resize(padded, 0);
        let start = self.add_chain(&stream);
        self.set_directory_start(start);
        start
    }

    /// Store MiniFAT entries as a chain and point the header at it
    pub fn add_minifat(&mut self, entries: &[u32]) -> u32 {
        let mut bytes: Vec<u8> = entries.iter().flat_map(|v| v.to_le_bytes()).collect();
        let padded = bytes.len().div_ceil(self.sector_size()) * self.sector_size();
        bytes.resize(padded, 0xFF);
        let start = self.add_chain(&bytes);
        let count = (padded / self.sector_size()) as u32;
        self.set_minifat(start, count);
        start
    }

    /// Append FAT sectors covering every sector (including themselves) and
    /// list them in the inline DIFAT slots.
    pub fn finish_fat(&mut self) {
        let per_sector = self.sector_size() / 4;
        let mut fat_count = 1;
        while (self.sectors.len() + fat_count) > fat_count * per_sector {
            fat_count += 1;
        }
        let first = self.sector_count();
        let ids: Vec<u32> = (first..first + fat_count as u32).collect();
        for &id in &ids {
            self.set_fat_entry(id, FATSECT);
        }
        let mut table = self.fat.clone();
        table.resize(fat_count * per_sector, FREESECT);
        for chunk in table.chunks(per_sector) {
            self.add_u32_sector(chunk);
        }
        self.set_fat_slots(&ids);
        self.num_fat_sectors = Some(fat_count as u32);
    }

    /// Write the FAT model into an existing sector and list it as the only FAT sector
    pub fn store_fat_in(&mut self, index: u32) {
        let mut table = self.fat.clone();
        table.resize(self.sector_size() / 4, FREESECT);
        self.write_u32s(index, &table);
        self.set_fat_slots(&[index]);
        self.num_fat_sectors = Some(1);
    }

    /// Serialize header and sectors
    pub fn build(&self) -> Vec<u8> {
        let mut data = header_bytes(self.sector_shift, self.mini_sector_shift, self.cutoff);
        let num_fat = self
            .num_fat_sectors
            .unwrap_or_else(|| self.difat.iter().filter(|&&s| s != FREESECT).count() as u32);
        data[0x2C..0x30].copy_from_slice(&num_fat.to_le_bytes());
        data[0x30..0x34].copy_from_slice(&self.first_dir_sector.to_le_bytes());
        data[0x3C..0x40].copy_from_slice(&self.first_minifat_sector.to_le_bytes());
        data[0x40..0x44].copy_from_slice(&self.num_minifat_sectors.to_le_bytes());
        data[0x44..0x48].copy_from_slice(&self.first_difat_sector.to_le_bytes());
        data[0x48..0x4C].copy_from_slice(&self.num_difat_sectors.to_le_bytes());
        for (slot, id) in self.difat.iter().enumerate() {
            let offset = HEADER_DIFAT_OFFSET + slot * 4;
            data[offset..offset + 4].copy_from_slice(&id.to_le_bytes());
        }
        data.resize(self.sector_size().max(HEADER_SIZE), 0);
        for sector in &self.sectors {
            data.extend_from_slice(sector);
        }
        data
    }
}

/// Build a well-formed container holding `streams` under the root.
///
/// Streams smaller than 4096 bytes go to the mini stream, larger ones get
/// their own regular chain. Directory entries follow the root in input order
/// and are linked as a right-leaning sibling list.
pub fn build_container<D: AsRef<[u8]>>(streams: &[(&str, D)]) -> Vec<u8> {
    build_container_in(ContainerBuilder::new(), streams)
}

/// Like [`build_container`], laid out with the geometry of `builder`.
pub fn build_container_in<D: AsRef<[u8]>>(
    mut builder: ContainerBuilder,
    streams: &[(&str, D)],
) -> Vec<u8> {
    let mini_size = 1usize << builder.mini_sector_shift;
    let cutoff = builder.cutoff as usize;
    let mut ministream = Vec::new();
    let mut minifat = Vec::new();
    let mut entries = Vec::new();

    for (name, data) in streams {
        let data = data.as_ref();
        let start = if data.is_empty() {
            ENDOFCHAIN
        } else if data.len() < cutoff {
            let first = (ministream.len() / mini_size) as u32;
            let count = data.len().div_ceil(mini_size) as u32;
            for i in 0..count {
                minifat.push(if i + 1 < count { first + i + 1 } else { ENDOFCHAIN });
            }
            ministream.extend_from_slice(data);
            ministream.resize(((first + count) as usize) * mini_size, 0);
            first
        } else {
            builder.add_chain(data)
        };
        entries.push(EntryRecord::stream(name, start, data.len() as u64));
    }

    let root_start = builder.add_chain(&ministream);
    if !minifat.is_empty() {
        builder.add_minifat(&minifat);
    }

    let count = entries.len() as u32;
    for (i, entry) in entries.iter_mut().enumerate() {
        let sid = i as u32 + 1;
        if sid < count {
            entry.right = sid + 1;
        }
    }
    let mut root = EntryRecord::root(root_start, ministream.len() as u64);
    if count > 0 {
        root.child = 1;
    }
    let mut directory = vec![root];
    directory.extend(entries);
    builder.add_directory(&directory);
    builder.finish_fat();
    builder.build()
}
