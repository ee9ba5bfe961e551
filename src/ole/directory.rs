//! Directory stream decoding and tree construction.
//!
//! The directory is an array of 128-byte records. Siblings are stored as a
//! red-black tree (left/right links) and each storage points at the root of
//! its contents' tree (child link). Each decoded node keeps the nodes its
//! links point at as `children`, so the tree mirrors the on-disk links.
//! [`DirectoryEntry::members`] resolves a storage's sibling tree into the
//! entries it contains, in sibling order.

use super::consts::*;
use super::error::{OleError, Result};
use super::sector::SectorId;
use encoding_rs::UTF_16LE;
use fixedbitset::FixedBitSet;
use smallvec::SmallVec;
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw directory entry structure (128 bytes)
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawDirectoryEntry {
    /// Entry name in UTF-16LE (64 bytes, null-padded)
    name: [u8; 64],
    /// Length of name in bytes (including null terminator)
    name_len: U16<LE>,
    entry_type: u8,
    node_color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    state_bits: U32<LE>,
    /// FILETIME
    creation_time: U64<LE>,
    /// FILETIME
    modified_time: U64<LE>,
    start_sector: U32<LE>,
    size_low: U32<LE>,
    size_high: U32<LE>,
}

/// Object type of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Empty,
    Storage,
    Stream,
    LockBytes,
    Property,
    Root,
}

impl TryFrom<u8> for EntryKind {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        Ok(match value {
            STGTY_EMPTY => EntryKind::Empty,
            STGTY_STORAGE => EntryKind::Storage,
            STGTY_STREAM => EntryKind::Stream,
            STGTY_LOCKBYTES => EntryKind::LockBytes,
            STGTY_PROPERTY => EntryKind::Property,
            STGTY_ROOT => EntryKind::Root,
            other => return Err(other),
        })
    }
}

/// Red-black tree node color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeColor {
    Red,
    Black,
}

/// A directory entry and, for storages, its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Index of the record in the directory stream
    pub id: u32,
    pub name: String,
    pub kind: EntryKind,
    pub color: NodeColor,
    /// Raw left sibling link
    pub left: u32,
    /// Raw right sibling link
    pub right: u32,
    /// Raw child link
    pub child: u32,
    pub clsid: [u8; 16],
    pub state_bits: u32,
    pub creation_time: u64,
    pub modified_time: u64,
    /// First sector of the stream (mini sector for small streams)
    pub start_sector: SectorId,
    pub stream_size: u64,
    /// Nodes linked from this record: left sibling, child (storages only),
    /// right sibling, each present only when the link is set
    pub children: Vec<DirectoryEntry>,
}

impl DirectoryEntry {
    #[inline]
    pub fn is_stream(&self) -> bool {
        self.kind == EntryKind::Stream
    }

    /// True for storages and the root entry.
    #[inline]
    pub fn is_storage(&self) -> bool {
        matches!(self.kind, EntryKind::Storage | EntryKind::Root)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.kind == EntryKind::Root
    }

    /// Find an entry contained in this storage by name.
    pub fn child(&self, name: &str, case_sensitive: bool) -> Option<&DirectoryEntry> {
        self.members()
            .into_iter()
            .find(|c| names_match(&c.name, name, case_sensitive))
    }

    #[inline]
    pub fn left_sibling(&self) -> Option<&DirectoryEntry> {
        self.linked(self.left)
    }

    #[inline]
    pub fn right_sibling(&self) -> Option<&DirectoryEntry> {
        self.linked(self.right)
    }

    /// Top of the sibling tree holding this storage's contents.
    #[inline]
    pub fn child_root(&self) -> Option<&DirectoryEntry> {
        if self.is_storage() { self.linked(self.child) } else { None }
    }

    fn linked(&self, id: u32) -> Option<&DirectoryEntry> {
        if id == NOSTREAM {
            return None;
        }
        self.children.iter().find(|c| c.id == id)
    }

    /// Entries contained in this storage, in sibling order.
    ///
    /// This is the in-order walk of the sibling tree below the child link:
    /// left peers, node, right peers. Empty for streams.
    pub fn members(&self) -> Vec<&DirectoryEntry> {
        let mut out = Vec::new();
        let mut stack: SmallVec<[&DirectoryEntry; 16]> = SmallVec::new();
        let mut current = self.child_root();
        loop {
            while let Some(node) = current {
                stack.push(node);
                current = node.left_sibling();
            }
            match stack.pop() {
                Some(node) => {
                    out.push(node);
                    current = node.right_sibling();
                },
                None => return out,
            }
        }
    }

    /// CLSID in registry format, or an empty string when it is all zeros.
    pub fn clsid_string(&self) -> String {
        format_clsid(&self.clsid)
    }

    /// Depth-first, pre-order iterator over this entry and its descendants.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

// Dropping a deeply nested tree recursively can exhaust the stack.
impl Drop for DirectoryEntry {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut entry) = pending.pop() {
            pending.append(&mut entry.children);
        }
    }
}

/// Iterator returned by [`DirectoryEntry::walk`].
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    stack: Vec<&'a DirectoryEntry>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a DirectoryEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.stack.pop()?;
        self.stack.extend(entry.children.iter().rev());
        Some(entry)
    }
}

fn names_match(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.chars()
            .flat_map(char::to_lowercase)
            .eq(b.chars().flat_map(char::to_lowercase))
    }
}

/// Format CLSID as a human-readable string
fn format_clsid(bytes: &[u8; 16]) -> String {
    if bytes.iter().all(|&b| b == 0) {
        return String::new();
    }

    // Format as: XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX
    format!(
        "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        u16::from_le_bytes([bytes[4], bytes[5]]),
        u16::from_le_bytes([bytes[6], bytes[7]]),
        bytes[8],
        bytes[9],
        bytes[10],
        bytes[11],
        bytes[12],
        bytes[13],
        bytes[14],
        bytes[15]
    )
}

/// Parse a directory stream and return the root entry with its subtree.
pub fn parse_directory(bytes: &[u8], sector_size: u64) -> Result<DirectoryEntry> {
    parse_directory_with(bytes, sector_size, false)
}

/// Like [`parse_directory`]; with `strict_stream_size` a nonzero high size
/// word on a 512-byte sector volume is an error instead of a warning.
pub(crate) fn parse_directory_with(
    bytes: &[u8],
    sector_size: u64,
    strict_stream_size: bool,
) -> Result<DirectoryEntry> {
    let count = u32::try_from(bytes.len() / DIRENTRY_SIZE).unwrap_or(u32::MAX);
    if count == 0 {
        return Err(OleError::MissingRootEntry);
    }

    let mut records = Vec::with_capacity(count as usize);
    for (index, chunk) in bytes.chunks_exact(DIRENTRY_SIZE).take(count as usize).enumerate() {
        records.push(decode_record(
            index as u32,
            chunk,
            count,
            sector_size,
            strict_stream_size,
        )?);
    }

    let root = build_tree(records)?;
    log::debug!(
        "directory: {} records, {} reachable",
        count,
        root.walk().count()
    );
    Ok(root)
}

fn decode_record(
    index: u32,
    chunk: &[u8],
    count: u32,
    sector_size: u64,
    strict_stream_size: bool,
) -> Result<DirectoryEntry> {
    let raw = RawDirectoryEntry::read_from_bytes(chunk).map_err(|_| OleError::MissingRootEntry)?;

    let kind = EntryKind::try_from(raw.entry_type).map_err(|actual| OleError::IncorrectStorageType {
        index,
        actual,
    })?;

    let color = match raw.node_color {
        COLOR_RED => NodeColor::Red,
        COLOR_BLACK => NodeColor::Black,
        actual => return Err(OleError::IncorrectDirectoryEntryColor { index, actual }),
    };

    match (index, kind) {
        (0, EntryKind::Root) => {},
        (0, _) => {
            return Err(OleError::IncorrectRootEntry {
                actual: raw.entry_type,
            });
        },
        (_, EntryKind::Root) => return Err(OleError::DuplicateRootEntry { index }),
        _ => {},
    }

    let left = raw.sid_left.get();
    let right = raw.sid_right.get();
    let child = raw.sid_child.get();
    for link in [left, right, child] {
        if link != NOSTREAM && link >= count {
            return Err(OleError::DirectoryEntryIndexOob {
                actual: link,
                expected: count,
            });
        }
    }

    let name = if kind == EntryKind::Empty {
        String::new()
    } else {
        decode_name(index, &raw)?
    };

    let low = u64::from(raw.size_low.get());
    let high = raw.size_high.get();
    let stream_size = if sector_size == SECTOR_SIZE_V3 {
        // Older writers leave garbage in the high word of 512-byte sector files
        if high != 0 && kind != EntryKind::Empty {
            if strict_stream_size {
                return Err(OleError::StreamSizeHighWordSet { index, high });
            }
            log::warn!(
                "directory entry {} ({:?}) has high size word {:#x}, ignoring it",
                index,
                name,
                high
            );
        }
        low
    } else {
        low | (u64::from(high) << 32)
    };

    Ok(DirectoryEntry {
        id: index,
        name,
        kind,
        color,
        left,
        right,
        child,
        clsid: raw.clsid,
        state_bits: raw.state_bits.get(),
        creation_time: raw.creation_time.get(),
        modified_time: raw.modified_time.get(),
        start_sector: SectorId::from_raw(raw.start_sector.get()),
        stream_size,
        children: Vec::new(),
    })
}

fn decode_name(index: u32, raw: &RawDirectoryEntry) -> Result<String> {
    let byte_count = raw.name_len.get();
    if byte_count < 2 || byte_count as usize > raw.name.len() || byte_count % 2 != 0 {
        return Err(OleError::MalformedDirectoryEntryName { index, byte_count });
    }
    // The count includes the terminating null code unit
    let (name, _) = UTF_16LE.decode_without_bom_handling(&raw.name[..byte_count as usize - 2]);
    Ok(name.into_owned())
}

/// Link the decoded records into a tree rooted at record 0.
///
/// Every node receives the nodes its own links point at, in the order left,
/// child, right. Left and right are followed for every kind, the child link
/// only for storages and the root. Each record may be reached once.
fn build_tree(records: Vec<DirectoryEntry>) -> Result<DirectoryEntry> {
    let count = records.len();
    let mut visited = FixedBitSet::with_capacity(count);
    visited.insert(0);

    let mut order: Vec<u32> = vec![0];
    let mut links: Vec<SmallVec<[u32; 3]>> = vec![SmallVec::new(); count];
    let mut cursor = 0;
    while cursor < order.len() {
        let index = order[cursor] as usize;
        cursor += 1;

        let record = &records[index];
        let child = if record.is_storage() { record.child } else { NOSTREAM };
        for link in [record.left, child, record.right] {
            if link == NOSTREAM {
                continue;
            }
            if visited.put(link as usize) {
                return Err(OleError::DirectoryEntryCycle { index: link });
            }
            order.push(link);
            links[index].push(link);
        }
    }

    // Linked nodes always appear after the node linking them in `order`
    let mut slots: Vec<Option<DirectoryEntry>> = records.into_iter().map(Some).collect();
    for &index in order.iter().rev() {
        let index = index as usize;
        let children: Vec<DirectoryEntry> = std::mem::take(&mut links[index])
            .into_iter()
            .filter_map(|c| slots[c as usize].take())
            .collect();
        if let Some(node) = slots[index].as_mut() {
            node.children = children;
        }
    }

    slots[0].take().ok_or(OleError::MissingRootEntry)
}
