//! File Allocation Table construction.
//!
//! The FAT is spread over sectors listed by the DIFAT: the first 109 pointers
//! live in the header, the remaining ones in a chain of DIFAT sectors. Each
//! DIFAT sector holds `sector_size / 4 - 1` pointers followed by the index of
//! the next DIFAT sector.

use super::consts::HEADER_DIFAT_ENTRIES;
use super::error::{OleError, Result};
use super::header::Header;
use super::sector::{SectorId, decode_entries};
use super::source::ByteSource;
use std::ops::Deref;

/// A decoded allocation table (FAT or MiniFAT).
///
/// Entry `i` is the successor of sector `i` in its chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationTable {
    entries: Vec<SectorId>,
}

impl AllocationTable {
    pub fn from_entries(entries: Vec<SectorId>) -> Self {
        Self { entries }
    }

    #[inline]
    pub fn entries(&self) -> &[SectorId] {
        &self.entries
    }

    /// Successor of `sector`, if the table covers it.
    #[inline]
    pub fn next(&self, sector: u32) -> Option<SectorId> {
        self.entries.get(sector as usize).copied()
    }

    /// Build the FAT of a file from the pointers in `header`, following the
    /// DIFAT chain when the header declares one.
    ///
    /// The result never holds more entries than the file has sectors.
    pub fn build<S: ByteSource + ?Sized>(header: &Header, source: &mut S) -> Result<Self> {
        let mut entries = Vec::new();
        load_fat_sectors(header, source, header.fat_sector_pointers.iter().copied(), &mut entries)?;
        truncate_to_sector_count(header, &mut entries);

        if header.num_difat_sectors > 0 {
            load_difat(header, source, &mut entries)?;
            truncate_to_sector_count(header, &mut entries);
        }

        log::debug!(
            "FAT: {} entries ({} FAT sectors declared)",
            entries.len(),
            header.num_fat_sectors
        );
        Ok(Self { entries })
    }
}

impl Deref for AllocationTable {
    type Target = [SectorId];

    fn deref(&self) -> &[SectorId] {
        &self.entries
    }
}

/// Read one whole sector. The header occupies the first sector slot, so
/// sector `index` starts at `(index + 1) * sector_size`.
fn read_sector<S: ByteSource + ?Sized>(header: &Header, source: &mut S, index: u32) -> Result<Vec<u8>> {
    let byte_offset = header.sector_size * (u64::from(index) + 1);
    if byte_offset >= header.file_size {
        return Err(OleError::InvalidFatSector { byte_offset });
    }
    let mut sector = Vec::with_capacity(header.sector_size as usize);
    source.read_at(byte_offset, header.sector_size as usize, &mut sector)?;
    Ok(sector)
}

/// Append the entries of every FAT sector in `pointers`, stopping at the
/// first end-of-chain or free pointer.
fn load_fat_sectors<S, I>(header: &Header, source: &mut S, pointers: I, entries: &mut Vec<SectorId>) -> Result<()>
where
    S: ByteSource + ?Sized,
    I: IntoIterator<Item = SectorId>,
{
    for pointer in pointers {
        if pointer.is_chain_terminator() {
            break;
        }
        let sector = read_sector(header, source, pointer.raw())?;
        decode_entries(&sector, entries);
    }
    Ok(())
}

fn load_difat<S: ByteSource + ?Sized>(header: &Header, source: &mut S, entries: &mut Vec<SectorId>) -> Result<()> {
    let header_entries = HEADER_DIFAT_ENTRIES as u32;
    if header.num_fat_sectors <= header_entries {
        return Err(OleError::IncorrectNumberOfFatSectors {
            actual: header.num_fat_sectors,
            expected: header_entries,
        });
    }

    let first = header.first_difat_sector.raw();
    if u64::from(first) >= header.sector_count {
        return Err(OleError::SectorIndexInDifatOob {
            actual: first,
            expected: header.sector_count,
        });
    }

    // The last slot of a DIFAT sector links to the next one
    let pointers_per_sector = (header.sector_size / 4 - 1) as u32;
    let expected = (header.num_fat_sectors - header_entries).div_ceil(pointers_per_sector);
    if header.num_difat_sectors != expected {
        return Err(OleError::IncorrectNumberOfDifatSectors {
            actual: header.num_difat_sectors,
            expected,
        });
    }

    let mut current = header.first_difat_sector;
    let mut pointers = Vec::with_capacity(pointers_per_sector as usize + 1);
    for _ in 0..expected {
        let sector = read_sector(header, source, current.raw())?;
        pointers.clear();
        decode_entries(&sector, &mut pointers);

        let split = pointers.len().min(pointers_per_sector as usize);
        load_fat_sectors(header, source, pointers[..split].iter().copied(), entries)?;
        current = pointers.get(split).copied().unwrap_or(SectorId::EndOfChain);
    }

    log::debug!("DIFAT: followed {} sectors from {}", expected, header.first_difat_sector);
    Ok(())
}

/// FAT sectors are always full, so the table usually describes sectors
/// past the end of the file. Those entries are dropped.
fn truncate_to_sector_count(header: &Header, entries: &mut Vec<SectorId>) {
    if entries.len() as u64 > header.sector_count {
        log::trace!(
            "discarding {} FAT entries past the last sector",
            entries.len() as u64 - header.sector_count
        );
        entries.truncate(header.sector_count as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::consts::*;
    use crate::ole::test_support::{ImageBuilder, patch_u32, raw_header};
    use std::io::Cursor;

    fn build(image: &[u8]) -> Result<AllocationTable> {
        let header = Header::parse(image, image.len() as u64)?;
        AllocationTable::build(&header, &mut Cursor::new(image))
    }

    #[test]
    fn test_table_covers_exactly_the_file_sectors() {
        let mut builder = ImageBuilder::new();
        let start = builder.add_chain(&[1u8; 1500]);
        let image = builder.build();

        let fat = build(&image).unwrap();
        // 3 data sectors, 1 directory sector, 1 FAT sector
        assert_eq!(fat.len(), 5);
        assert_eq!(start, 0);
        assert_eq!(fat[0], SectorId::Regular(1));
        assert_eq!(fat[1], SectorId::Regular(2));
        assert_eq!(fat[2], SectorId::EndOfChain);
        assert_eq!(fat[4], SectorId::FatSector);
        assert_eq!(fat.next(2), Some(SectorId::EndOfChain));
        assert_eq!(fat.next(5), None);
    }

    #[test]
    fn test_pointer_past_end_of_file() {
        let mut image = ImageBuilder::new().build();
        patch_u32(&mut image, 0x4C, 1000);
        assert!(matches!(
            build(&image),
            Err(OleError::InvalidFatSector { byte_offset: 512_512 })
        ));
    }

    #[test]
    fn test_scan_stops_at_first_terminator() {
        let mut image = ImageBuilder::new().build();
        // FAT is the second sector; anything after the terminator is ignored
        patch_u32(&mut image, 0x50, ENDOFCHAIN);
        patch_u32(&mut image, 0x54, 5000);
        let fat = build(&image).unwrap();
        assert_eq!(fat.len(), 2);
        assert_eq!(fat[1], SectorId::FatSector);
    }

    /// Header pointing 109 times at sector 0, with `num_fat`/`num_difat`
    /// and the first DIFAT sector patched in.
    fn difat_header(num_fat: u32, first_difat: u32, num_difat: u32) -> Vec<u8> {
        let mut h = raw_header();
        for i in 0..HEADER_DIFAT_ENTRIES {
            patch_u32(&mut h, 0x4C + i * 4, 0);
        }
        patch_u32(&mut h, 0x2C, num_fat);
        patch_u32(&mut h, 0x44, first_difat);
        patch_u32(&mut h, 0x48, num_difat);
        h
    }

    fn filled_sector(value: u32) -> Vec<u8> {
        std::iter::repeat_n(value.to_le_bytes(), 128).flatten().collect()
    }

    fn difat_sector(pointers: &[u32], next: u32) -> Vec<u8> {
        let mut slots = vec![FREESECT; 127];
        slots[..pointers.len()].copy_from_slice(pointers);
        slots.push(next);
        slots.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_difat_extends_the_table() {
        // sector 0: FAT sector full of 7, sector 1: FAT sector full of 9,
        // sector 2: DIFAT sector pointing at sector 1
        let mut image = difat_header(110, 2, 1);
        image.extend(filled_sector(7));
        image.extend(filled_sector(9));
        image.extend(difat_sector(&[1], ENDOFCHAIN));
        image.resize(512 * 14_101, 0);

        let fat = build(&image).unwrap();
        assert_eq!(fat.len(), 14_080);
        assert_eq!(fat[0], SectorId::Regular(7));
        assert_eq!(fat[13_951], SectorId::Regular(7));
        assert_eq!(fat[13_952], SectorId::Regular(9));
        assert_eq!(fat[14_079], SectorId::Regular(9));
    }

    #[test]
    fn test_difat_chain_is_followed() {
        // First DIFAT sector holds no pointer but links to the second one
        let mut image = difat_header(109 + 127 + 1, 2, 2);
        image.extend(filled_sector(7));
        image.extend(filled_sector(9));
        image.extend(difat_sector(&[ENDOFCHAIN], 3));
        image.extend(difat_sector(&[1], ENDOFCHAIN));
        image.resize(512 * 14_101, 0);

        let fat = build(&image).unwrap();
        assert_eq!(fat.len(), 14_080);
        assert_eq!(fat[13_952], SectorId::Regular(9));
    }

    #[test]
    fn test_difat_requires_more_than_header_pointers() {
        let mut image = difat_header(109, 1, 1);
        image.resize(512 * 4, 0);
        assert!(matches!(
            build(&image),
            Err(OleError::IncorrectNumberOfFatSectors {
                actual: 109,
                expected: 109
            })
        ));
    }

    #[test]
    fn test_difat_start_out_of_bounds() {
        let mut image = difat_header(110, 9999, 1);
        image.resize(512 * 4, 0);
        assert!(matches!(
            build(&image),
            Err(OleError::SectorIndexInDifatOob {
                actual: 9999,
                expected: 3
            })
        ));
    }

    #[test]
    fn test_difat_count_mismatch() {
        let mut image = difat_header(110, 1, 2);
        image.resize(512 * 4, 0);
        assert!(matches!(
            build(&image),
            Err(OleError::IncorrectNumberOfDifatSectors {
                actual: 2,
                expected: 1
            })
        ));
    }
}
