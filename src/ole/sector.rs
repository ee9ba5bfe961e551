//! Decoded allocation table values.
//!
//! FAT and MiniFAT entries are raw 32-bit values where the top of the range is
//! reserved for markers. They are decoded once when a table is built so the
//! chain walkers match on [`SectorId`] instead of comparing magic numbers.

use super::consts::*;

/// A decoded FAT/MiniFAT entry or sector pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectorId {
    /// An addressable sector
    Regular(u32),
    /// `0xFFFFFFFA`, the upper bound of regular sector numbers
    MaxRegular,
    /// `0xFFFFFFFB`, reserved
    Reserved,
    /// `0xFFFFFFFC`, marks a DIFAT sector inside the FAT
    DifatSector,
    /// `0xFFFFFFFD`, marks a FAT sector inside the FAT
    FatSector,
    /// `0xFFFFFFFE`, terminates a chain
    EndOfChain,
    /// `0xFFFFFFFF`, unallocated
    Free,
}

impl SectorId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            MAXREGSECT => SectorId::MaxRegular,
            NOTAPPLICABLE => SectorId::Reserved,
            DIFSECT => SectorId::DifatSector,
            FATSECT => SectorId::FatSector,
            ENDOFCHAIN => SectorId::EndOfChain,
            FREESECT => SectorId::Free,
            n => SectorId::Regular(n),
        }
    }

    /// The on-disk value.
    #[inline]
    pub const fn raw(self) -> u32 {
        match self {
            SectorId::Regular(n) => n,
            SectorId::MaxRegular => MAXREGSECT,
            SectorId::Reserved => NOTAPPLICABLE,
            SectorId::DifatSector => DIFSECT,
            SectorId::FatSector => FATSECT,
            SectorId::EndOfChain => ENDOFCHAIN,
            SectorId::Free => FREESECT,
        }
    }

    /// Sector number, if this value addresses a sector at all.
    #[inline]
    pub const fn index(self) -> Option<u32> {
        match self {
            SectorId::Regular(n) => Some(n),
            _ => None,
        }
    }

    /// End-of-chain and free are the two values that stop a scan over
    /// a list of FAT sector pointers.
    #[inline]
    pub const fn is_chain_terminator(self) -> bool {
        matches!(self, SectorId::EndOfChain | SectorId::Free)
    }
}

impl From<u32> for SectorId {
    fn from(raw: u32) -> Self {
        SectorId::from_raw(raw)
    }
}

impl std::fmt::Display for SectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectorId::Regular(n) => write!(f, "{}", n),
            SectorId::MaxRegular => write!(f, "MAXREGSECT"),
            SectorId::Reserved => write!(f, "NOTAPPLICABLE"),
            SectorId::DifatSector => write!(f, "DIFSECT"),
            SectorId::FatSector => write!(f, "FATSECT"),
            SectorId::EndOfChain => write!(f, "ENDOFCHAIN"),
            SectorId::Free => write!(f, "FREESECT"),
        }
    }
}

/// Decode a little-endian byte buffer into table entries.
///
/// Trailing bytes that do not form a whole entry are ignored.
pub(crate) fn decode_entries(bytes: &[u8], out: &mut Vec<SectorId>) {
    out.reserve(bytes.len() / 4);
    out.extend(
        bytes
            .chunks_exact(4)
            .map(|c| SectorId::from_raw(u32::from_le_bytes([c[0], c[1], c[2], c[3]]))),
    );
}
