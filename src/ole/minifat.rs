//! MiniFAT construction.
//!
//! The MiniFAT is itself a regular stream, stored in FAT sectors starting at
//! the header's first MiniFAT sector. Only the entries that address the mini
//! stream (whose size is recorded in the root entry) are kept.

use super::error::{OleError, Result};
use super::fat::AllocationTable;
use super::header::Header;
use super::sector::decode_entries;
use super::source::ByteSource;
use super::stream::{ChainRequest, read_chain};

impl AllocationTable {
    /// Build the MiniFAT for a mini stream of `mini_stream_size` bytes.
    ///
    /// Files without small streams have no MiniFAT at all; that yields an
    /// empty table.
    pub fn build_mini<S: ByteSource + ?Sized>(
        header: &Header,
        mini_stream_size: u64,
        fat: &AllocationTable,
        source: &mut S,
    ) -> Result<Self> {
        let allocated = u64::from(header.num_minifat_sectors) * header.sector_size;
        let request = ChainRequest::new(
            header.first_minifat_sector,
            Some(allocated),
            header.sector_size,
            header.sector_size,
        )
        .allow_empty(true);
        let bytes = read_chain(source, fat.entries(), &request)?;

        let used = mini_stream_size.div_ceil(header.mini_sector_size);
        let available = bytes.len() as u64 / 4;
        if used > available {
            return Err(OleError::IncompleteMiniFat {
                actual: available,
                expected: used,
            });
        }

        let mut entries = Vec::new();
        decode_entries(&bytes[..used as usize * 4], &mut entries);
        log::debug!(
            "MiniFAT: {} of {} entries in use",
            entries.len(),
            available
        );
        Ok(Self::from_entries(entries))
    }
}
