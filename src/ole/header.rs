//! Compound file header (superblock) decoding and validation.
//!
//! The first 512 bytes of every compound file hold a fixed structure followed
//! by the first 109 FAT sector pointers. For version 4 files the rest of the
//! 4096-byte header sector is zero padding and is ignored.
//!
//! ```text
//! [00H,08] signature            [30H,04] first directory sector
//! [08H,16] CLSID (zero)         [34H,04] transaction signature
//! [18H,02] minor version        [38H,04] mini stream cutoff (4096)
//! [1AH,02] major version        [3CH,04] first MiniFAT sector
//! [1CH,02] byte order (FFFE)    [40H,04] MiniFAT sector count
//! [1EH,02] sector shift         [44H,04] first DIFAT sector
//! [20H,02] mini sector shift    [48H,04] DIFAT sector count
//! [22H,06] reserved             [4CH,436] FAT sector pointers
//! [28H,04] directory sectors
//! [2CH,04] FAT sector count
//! ```

use super::consts::*;
use super::error::{OleError, Result};
use super::sector::SectorId;
use zerocopy::{FromBytes, LE, U16, U32};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw on-disk header layout (512 bytes).
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawHeader {
    signature: [u8; 8],
    clsid: [u8; 16],
    minor_version: U16<LE>,
    dll_version: U16<LE>,
    byte_order: U16<LE>,
    sector_shift: U16<LE>,
    mini_sector_shift: U16<LE>,
    reserved1: U16<LE>,
    reserved2: U32<LE>,
    num_dir_sectors: U32<LE>,
    num_fat_sectors: U32<LE>,
    first_dir_sector: U32<LE>,
    transaction_signature: U32<LE>,
    mini_stream_cutoff: U32<LE>,
    first_minifat_sector: U32<LE>,
    num_minifat_sectors: U32<LE>,
    first_difat_sector: U32<LE>,
    num_difat_sectors: U32<LE>,
    difat: [U32<LE>; HEADER_DIFAT_ENTRIES],
}

/// Validated volume geometry and chain entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub minor_version: u16,
    /// Major version: 3 (512-byte sectors) or 4 (4096-byte sectors)
    pub dll_version: u16,
    pub sector_size: u64,
    pub mini_sector_size: u64,
    /// Always 0 for version 3 files
    pub num_dir_sectors: u32,
    pub num_fat_sectors: u32,
    pub first_dir_sector: SectorId,
    pub transaction_signature: u32,
    pub mini_stream_cutoff: u32,
    pub first_minifat_sector: SectorId,
    pub num_minifat_sectors: u32,
    pub first_difat_sector: SectorId,
    pub num_difat_sectors: u32,
    /// The 109 FAT sector pointers stored in the header
    pub fat_sector_pointers: Vec<SectorId>,
    /// Total size of the file in bytes
    pub file_size: u64,
    /// Number of sectors in the file, header sector excluded
    pub sector_count: u64,
}

impl Header {
    /// Decode and validate the header from the first bytes of the file.
    ///
    /// `first_sector` must contain at least the 512 header bytes and
    /// `file_size` is the total length of the file.
    pub fn parse(first_sector: &[u8], file_size: u64) -> Result<Self> {
        if file_size < HEADER_SIZE as u64 || first_sector.len() < HEADER_SIZE {
            return Err(OleError::IncompleteHeader { file_size });
        }

        let fields = RawHeader::read_from_bytes(&first_sector[..HEADER_SIZE])
            .map_err(|_| OleError::IncompleteHeader { file_size })?;

        if &fields.signature != MAGIC {
            return Err(OleError::NotOleFile);
        }

        // According to AAF specs, CLSID should always be zero
        if fields.clsid.iter().any(|&b| b != 0) {
            return Err(OleError::IncorrectClsid);
        }

        // version 3: usual format, 512 bytes per sector
        // version 4: large format, 4K per sector
        let dll_version = fields.dll_version.get();
        let expected_sector_size = match dll_version {
            3 => SECTOR_SIZE_V3,
            4 => SECTOR_SIZE_V4,
            actual => return Err(OleError::IncorrectDllVersion { actual }),
        };

        if fields.byte_order.get() != BYTE_ORDER_LE {
            return Err(OleError::BigEndianNotSupported);
        }

        let sector_size = size_from_shift(fields.sector_shift.get());
        if sector_size != expected_sector_size {
            return Err(OleError::IncorrectSectorSize {
                actual: sector_size,
                expected: expected_sector_size,
            });
        }

        let mini_sector_size = size_from_shift(fields.mini_sector_shift.get());
        if mini_sector_size != MINI_SECTOR_SIZE {
            return Err(OleError::IncorrectMiniSectorSize {
                actual: mini_sector_size,
                expected: MINI_SECTOR_SIZE,
            });
        }

        if fields.reserved1.get() != 0 || fields.reserved2.get() != 0 {
            return Err(OleError::IncorrectHeaderReservedBytes);
        }

        let num_dir_sectors = fields.num_dir_sectors.get();
        if dll_version == 3 && num_dir_sectors != 0 {
            return Err(OleError::IncorrectNumberOfDirectorySectors {
                actual: num_dir_sectors,
                expected: 0,
            });
        }

        // Any user-defined stream larger than or equal to this cutoff is
        // allocated from the FAT, everything smaller from the MiniFAT
        let mini_stream_cutoff = fields.mini_stream_cutoff.get();
        if mini_stream_cutoff != MINI_STREAM_CUTOFF {
            return Err(OleError::IncorrectMiniStreamCutoffSize {
                actual: mini_stream_cutoff,
                expected: MINI_STREAM_CUTOFF,
            });
        }

        let sector_count = file_size.div_ceil(sector_size).saturating_sub(1);

        let header = Header {
            minor_version: fields.minor_version.get(),
            dll_version,
            sector_size,
            mini_sector_size,
            num_dir_sectors,
            num_fat_sectors: fields.num_fat_sectors.get(),
            first_dir_sector: SectorId::from_raw(fields.first_dir_sector.get()),
            transaction_signature: fields.transaction_signature.get(),
            mini_stream_cutoff,
            first_minifat_sector: SectorId::from_raw(fields.first_minifat_sector.get()),
            num_minifat_sectors: fields.num_minifat_sectors.get(),
            first_difat_sector: SectorId::from_raw(fields.first_difat_sector.get()),
            num_difat_sectors: fields.num_difat_sectors.get(),
            fat_sector_pointers: fields
                .difat
                .iter()
                .map(|p| SectorId::from_raw(p.get()))
                .collect(),
            file_size,
            sector_count,
        };

        log::debug!(
            "compound file v{}.{}: {} bytes, {} sectors of {} bytes, {} FAT / {} DIFAT / {} MiniFAT sectors",
            header.dll_version,
            header.minor_version,
            header.file_size,
            header.sector_count,
            header.sector_size,
            header.num_fat_sectors,
            header.num_difat_sectors,
            header.num_minifat_sectors,
        );

        Ok(header)
    }
}

#[inline]
fn size_from_shift(shift: u16) -> u64 {
    1u64.checked_shl(u32::from(shift)).unwrap_or(0)
}

/// Check if a file/data is an OLE file by checking magic bytes
///
/// Only the signature is inspected; use [`Header::parse`] for full validation.
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE && &data[0..8] == MAGIC
}
