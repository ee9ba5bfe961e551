//! Stream reconstruction by walking a sector chain.
//!
//! The same walker serves the FAT (regular sectors, addressed past the header
//! sector) and the MiniFAT (64-byte mini sectors, addressed inside the mini
//! stream). The number of iterations is bounded by the table length before the
//! walk starts, so a cyclic table cannot make it loop forever.

use super::error::{OleError, Result};
use super::sector::SectorId;
use super::source::ByteSource;

/// Parameters of one chain reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainRequest {
    /// First sector of the chain
    pub start: SectorId,
    /// Declared stream size, or `None` to read until end-of-chain
    pub declared_size: Option<u64>,
    /// Byte offset of sector 0 in the source (one sector for the FAT, 0 for the mini stream)
    pub base_offset: u64,
    /// Size of one sector of this table
    pub sector_size: u64,
    /// Accept `declared_size == 0` together with an end-of-chain start
    pub allow_empty: bool,
}

impl ChainRequest {
    pub fn new(start: SectorId, declared_size: Option<u64>, base_offset: u64, sector_size: u64) -> Self {
        Self {
            start,
            declared_size,
            base_offset,
            sector_size,
            allow_empty: false,
        }
    }

    #[inline]
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }
}

/// Read the stream described by `request`, following `table` from sector to sector.
///
/// The returned buffer is exactly the declared size when one was given. For
/// streams of unknown size the result is every sector up to end-of-chain.
///
/// When the chain ends before `declared_size` bytes were read, the error's
/// `expected` is the declared size.
pub fn read_chain<S: ByteSource + ?Sized>(
    source: &mut S,
    table: &[SectorId],
    request: &ChainRequest,
) -> Result<Vec<u8>> {
    let ChainRequest {
        start,
        declared_size,
        base_offset,
        sector_size,
        allow_empty,
    } = *request;

    if sector_size == 0 {
        return Err(OleError::ZeroSectorSize);
    }

    if declared_size == Some(0) && start == SectorId::EndOfChain {
        return if allow_empty {
            Ok(Vec::new())
        } else {
            Err(OleError::InvalidEmptyStream)
        };
    }

    let table_len = table.len() as u64;
    let effective_size = declared_size.unwrap_or_else(|| table_len.saturating_mul(sector_size));
    let sectors_needed = effective_size.div_ceil(sector_size);

    // A stream can never span more sectors than the table addresses
    if sectors_needed > table_len {
        return Err(OleError::StreamTooLarge {
            actual: sectors_needed,
            expected: table_len,
        });
    }

    log::trace!(
        "reading chain from sector {} ({} sectors of {} bytes, declared size {:?})",
        start,
        sectors_needed,
        sector_size,
        declared_size
    );

    let mut data = Vec::with_capacity(declared_size.unwrap_or(0) as usize);
    let mut current = start;
    for _ in 0..sectors_needed {
        let index = match current {
            SectorId::EndOfChain => match declared_size {
                Some(expected) if (data.len() as u64) < expected => {
                    return Err(OleError::IncompleteStream {
                        first_sector: start.raw(),
                        actual: data.len() as u64,
                        expected,
                    });
                },
                _ => break,
            },
            SectorId::Regular(index) if u64::from(index) < table_len => index,
            other => {
                return Err(OleError::InvalidSectorId {
                    id: other.raw(),
                    total: table_len,
                });
            },
        };

        let offset = base_offset + sector_size * u64::from(index);
        // The last sector of a file is sometimes shorter than a full sector
        if u64::from(index) == table_len - 1 {
            source.read_rest(offset, &mut data)?;
        } else {
            source.read_at(offset, sector_size as usize, &mut data)?;
        }

        current = table[index as usize];
    }

    if data.len() as u64 > effective_size {
        data.truncate(effective_size as usize);
    } else if let Some(expected) = declared_size
        && (data.len() as u64) < expected
    {
        return Err(OleError::IncompleteStream {
            first_sector: start.raw(),
            actual: data.len() as u64,
            expected,
        });
    }

    Ok(data)
}
