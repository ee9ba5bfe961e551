/// Magic bytes that should be at the beginning of every OLE file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Size of the fixed header structure, including the 109 FAT sector pointers
pub const HEADER_SIZE: usize = 512;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Sector size for version 3 (512 bytes)
pub const SECTOR_SIZE_V3: u64 = 512;

/// Sector size for version 4 (4096 bytes)
pub const SECTOR_SIZE_V4: u64 = 4096;

/// The only mini sector size allowed by MS-CFB
pub const MINI_SECTOR_SIZE: u64 = 64;

/// The only mini stream cutoff allowed by MS-CFB
pub const MINI_STREAM_CUTOFF: u32 = 0x1000;

/// Byte order marker for little-endian files
pub const BYTE_ORDER_LE: u16 = 0xFFFE;

/// Number of FAT sector pointers stored in the header itself
/// (always 109, whatever the sector size: 76 + 4 * 109 = 512)
pub const HEADER_DIFAT_ENTRIES: usize = 109;

// Sector IDs (from AAF specifications)
/// Maximum regular sector ID
pub const MAXREGSECT: u32 = 0xFFFFFFFA; // -6
/// Reserved for future use
pub const NOTAPPLICABLE: u32 = 0xFFFFFFFB; // -5
/// Denotes a DIFAT sector in a FAT
pub const DIFSECT: u32 = 0xFFFFFFFC; // -4
/// Denotes a FAT sector in a FAT
pub const FATSECT: u32 = 0xFFFFFFFD; // -3
/// End of a virtual stream chain
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE; // -2
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFFFFFF; // -1

// Directory Entry IDs (from AAF specifications)
/// Maximum directory entry ID
pub const MAXREGSID: u32 = 0xFFFFFFFA; // -6
/// Unallocated directory entry
pub const NOSTREAM: u32 = 0xFFFFFFFF; // -1

// Object types in storage (from AAF specifications)
/// Empty directory entry
pub const STGTY_EMPTY: u8 = 0;
/// Element is a storage object
pub const STGTY_STORAGE: u8 = 1;
/// Element is a stream object
pub const STGTY_STREAM: u8 = 2;
/// Element is an ILockBytes object
pub const STGTY_LOCKBYTES: u8 = 3;
/// Element is an IPropertyStorage object
pub const STGTY_PROPERTY: u8 = 4;
/// Element is a root storage
pub const STGTY_ROOT: u8 = 5;

// Red-black tree node colors
pub const COLOR_RED: u8 = 0;
pub const COLOR_BLACK: u8 = 1;

/// Maximum number of UTF-16 code units in an entry name (excluding the terminator)
pub const MAX_NAME_UNITS: usize = 31;
