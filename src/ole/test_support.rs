//! Synthetic compound file images for tests.
//!
//! Builds minimal version 3 (512-byte sector) files: regular chains, a mini
//! stream with its MiniFAT, a directory and trailing FAT sectors. Every field
//! of a directory record can be overridden so tests can produce broken files.

use super::consts::*;

const SECTOR: usize = 512;
const ENTRIES_PER_SECTOR: usize = SECTOR / 4;

/// One 128-byte directory record, with raw field values.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub name: String,
    /// Overrides the computed name buffer length
    pub name_len: Option<u16>,
    pub kind: u8,
    pub color: u8,
    pub left: u32,
    pub right: u32,
    pub child: u32,
    pub clsid: [u8; 16],
    pub start: u32,
    pub size: u64,
}

impl Entry {
    fn new(name: &str, kind: u8) -> Self {
        Self {
            name: name.to_string(),
            name_len: None,
            kind,
            color: COLOR_BLACK,
            left: NOSTREAM,
            right: NOSTREAM,
            child: NOSTREAM,
            clsid: [0; 16],
            start: ENDOFCHAIN,
            size: 0,
        }
    }

    pub fn root() -> Self {
        Self::new("Root Entry", STGTY_ROOT)
    }

    pub fn storage(name: &str) -> Self {
        Self::new(name, STGTY_STORAGE)
    }

    pub fn stream(name: &str, start: u32, size: u64) -> Self {
        Self {
            start,
            size,
            ..Self::new(name, STGTY_STREAM)
        }
    }

    pub fn empty() -> Self {
        Self {
            name_len: Some(0),
            color: COLOR_RED,
            ..Self::new("", STGTY_EMPTY)
        }
    }

    pub fn left(mut self, index: u32) -> Self {
        self.left = index;
        self
    }

    pub fn right(mut self, index: u32) -> Self {
        self.right = index;
        self
    }

    pub fn child(mut self, index: u32) -> Self {
        self.child = index;
        self
    }

    pub fn to_bytes(&self) -> [u8; DIRENTRY_SIZE] {
        let mut rec = [0u8; DIRENTRY_SIZE];
        let units: Vec<u16> = self.name.encode_utf16().take(MAX_NAME_UNITS).collect();
        for (i, unit) in units.iter().enumerate() {
            rec[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        let name_len = self
            .name_len
            .unwrap_or(((units.len() + 1) * 2) as u16);
        rec[64..66].copy_from_slice(&name_len.to_le_bytes());
        rec[66] = self.kind;
        rec[67] = self.color;
        rec[68..72].copy_from_slice(&self.left.to_le_bytes());
        rec[72..76].copy_from_slice(&self.right.to_le_bytes());
        rec[76..80].copy_from_slice(&self.child.to_le_bytes());
        rec[80..96].copy_from_slice(&self.clsid);
        rec[116..120].copy_from_slice(&self.start.to_le_bytes());
        rec[120..128].copy_from_slice(&self.size.to_le_bytes());
        rec
    }
}

/// Serialize records back to back, as they appear in the directory stream.
pub(crate) fn directory_bytes(entries: &[Entry]) -> Vec<u8> {
    entries.iter().flat_map(|e| e.to_bytes()).collect()
}

/// Directory of an encrypted OOXML package, as Office writes it.
///
/// `EncryptionInfo` tops the root's sibling tree with `\u{6}DataSpaces` as its
/// left peer and `EncryptedPackage` as its right peer. `DataSpaceMap` tops the
/// data spaces storage, with `Version` and `DataSpaceInfo` as its peers.
/// Stream records carry `(start, size)` from `streams`, in the order
/// EncryptionInfo, EncryptedPackage, DataSpaceMap, Version.
pub(crate) fn encryption_info_entries(streams: [(u32, u64); 4]) -> Vec<Entry> {
    let [info, package, map, version] = streams;
    vec![
        Entry::root().child(1),
        Entry::stream("EncryptionInfo", info.0, info.1).left(2).right(3),
        Entry::storage("\u{6}DataSpaces").child(4),
        Entry::stream("EncryptedPackage", package.0, package.1),
        Entry::stream("DataSpaceMap", map.0, map.1).left(5).right(6),
        Entry::stream("Version", version.0, version.1),
        Entry::storage("DataSpaceInfo"),
    ]
}

/// Overwrite a little-endian u32 in a file image.
pub(crate) fn patch_u32(image: &mut [u8], offset: usize, value: u32) {
    image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// A valid version 3 header: one FAT sector at sector 0, directory at
/// sector 1, no MiniFAT and no DIFAT.
pub(crate) fn raw_header() -> Vec<u8> {
    let mut h = vec![0u8; HEADER_SIZE];
    h[0..8].copy_from_slice(MAGIC);
    h[0x18..0x1A].copy_from_slice(&0x3Eu16.to_le_bytes());
    h[0x1A..0x1C].copy_from_slice(&3u16.to_le_bytes());
    h[0x1C..0x1E].copy_from_slice(&BYTE_ORDER_LE.to_le_bytes());
    h[0x1E..0x20].copy_from_slice(&9u16.to_le_bytes());
    h[0x20..0x22].copy_from_slice(&6u16.to_le_bytes());
    patch_u32(&mut h, 0x2C, 1);
    patch_u32(&mut h, 0x30, 1);
    patch_u32(&mut h, 0x38, MINI_STREAM_CUTOFF);
    patch_u32(&mut h, 0x3C, ENDOFCHAIN);
    patch_u32(&mut h, 0x44, ENDOFCHAIN);
    patch_u32(&mut h, 0x4C, 0);
    for i in 1..HEADER_DIFAT_ENTRIES {
        patch_u32(&mut h, 0x4C + i * 4, FREESECT);
    }
    h
}

/// Builder for a complete compound file image.
///
/// Entry 0 is always the root. Sectors are laid out in allocation order,
/// with the FAT sectors appended last.
#[derive(Debug)]
pub(crate) struct ImageBuilder {
    sectors: Vec<[u8; SECTOR]>,
    fat: Vec<u32>,
    entries: Vec<Entry>,
    mini_stream: Vec<u8>,
    mini_fat: Vec<u32>,
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            sectors: Vec::new(),
            fat: Vec::new(),
            entries: vec![Entry::root()],
            mini_stream: Vec::new(),
            mini_fat: Vec::new(),
        }
    }

    /// Store `data` in consecutive sectors linked through the FAT.
    /// Returns the first sector, or `ENDOFCHAIN` for empty data.
    pub fn add_chain(&mut self, data: &[u8]) -> u32 {
        if data.is_empty() {
            return ENDOFCHAIN;
        }
        let start = self.sectors.len() as u32;
        let count = data.len().div_ceil(SECTOR);
        for (i, chunk) in data.chunks(SECTOR).enumerate() {
            let mut sector = [0u8; SECTOR];
            sector[..chunk.len()].copy_from_slice(chunk);
            self.sectors.push(sector);
            self.fat.push(if i + 1 < count {
                start + i as u32 + 1
            } else {
                ENDOFCHAIN
            });
        }
        start
    }

    /// Store `data` in the mini stream. Returns the first mini sector,
    /// or `ENDOFCHAIN` for empty data.
    pub fn add_mini(&mut self, data: &[u8]) -> u32 {
        if data.is_empty() {
            return ENDOFCHAIN;
        }
        let mini = MINI_SECTOR_SIZE as usize;
        let start = self.mini_fat.len() as u32;
        let count = data.len().div_ceil(mini);
        for i in 0..count {
            self.mini_fat.push(if i + 1 < count {
                start + i as u32 + 1
            } else {
                ENDOFCHAIN
            });
        }
        self.mini_stream.extend_from_slice(data);
        self.mini_stream.resize((start as usize + count) * mini, 0);
        start
    }

    /// Overwrite one FAT entry of an already allocated sector.
    pub fn set_fat(&mut self, sector: u32, value: u32) {
        self.fat[sector as usize] = value;
    }

    /// Append a directory record and return its index.
    pub fn add_entry(&mut self, entry: Entry) -> u32 {
        self.entries.push(entry);
        (self.entries.len() - 1) as u32
    }

    pub fn entry_mut(&mut self, index: u32) -> &mut Entry {
        &mut self.entries[index as usize]
    }

    pub fn build(mut self) -> Vec<u8> {
        let mut first_minifat = ENDOFCHAIN;
        let mut num_minifat = 0u32;
        if !self.mini_stream.is_empty() {
            let mini_stream = std::mem::take(&mut self.mini_stream);
            let root_start = self.add_chain(&mini_stream);
            self.entries[0].start = root_start;
            self.entries[0].size = mini_stream.len() as u64;

            let mut table = std::mem::take(&mut self.mini_fat);
            table.resize(table.len().div_ceil(ENTRIES_PER_SECTOR) * ENTRIES_PER_SECTOR, FREESECT);
            let bytes: Vec<u8> = table.iter().flat_map(|v| v.to_le_bytes()).collect();
            first_minifat = self.add_chain(&bytes);
            num_minifat = (bytes.len() / SECTOR) as u32;
        }

        let records_per_sector = SECTOR / DIRENTRY_SIZE;
        let padded = self.entries.len().div_ceil(records_per_sector) * records_per_sector;
        let mut records = self.entries.clone();
        records.resize(padded, Entry::empty());
        let dir_start = self.add_chain(&directory_bytes(&records));

        // FAT sectors go last and must also describe themselves
        let content = self.sectors.len();
        let mut fat_sectors = 1;
        while fat_sectors * ENTRIES_PER_SECTOR < content + fat_sectors {
            fat_sectors += 1;
        }
        assert!(fat_sectors <= HEADER_DIFAT_ENTRIES, "image too large for a header-only FAT");

        let mut fat = self.fat.clone();
        fat.extend(std::iter::repeat_n(FATSECT, fat_sectors));
        fat.resize(fat_sectors * ENTRIES_PER_SECTOR, FREESECT);

        let mut header = raw_header();
        patch_u32(&mut header, 0x2C, fat_sectors as u32);
        patch_u32(&mut header, 0x30, dir_start);
        patch_u32(&mut header, 0x3C, first_minifat);
        patch_u32(&mut header, 0x40, num_minifat);
        for i in 0..HEADER_DIFAT_ENTRIES {
            let pointer = if i < fat_sectors {
                (content + i) as u32
            } else {
                FREESECT
            };
            patch_u32(&mut header, 0x4C + i * 4, pointer);
        }

        let mut image = header;
        for sector in &self.sectors {
            image.extend_from_slice(sector);
        }
        image.extend(fat.iter().flat_map(|v| v.to_le_bytes()));
        image
    }
}

/// A complete image with the [`encryption_info_entries`] directory.
pub(crate) fn encryption_info_image(info: &[u8], package: &[u8], map: &[u8], version: &[u8]) -> Vec<u8> {
    let mut builder = ImageBuilder::new();
    let mut place = |data: &[u8]| {
        let start = if data.len() < MINI_STREAM_CUTOFF as usize {
            builder.add_mini(data)
        } else {
            builder.add_chain(data)
        };
        (start, data.len() as u64)
    };
    let streams = [place(info), place(package), place(map), place(version)];
    let mut entries = encryption_info_entries(streams).into_iter();
    if let Some(root) = entries.next() {
        builder.entry_mut(0).child = root.child;
    }
    for entry in entries {
        builder.add_entry(entry);
    }
    builder.build()
}
