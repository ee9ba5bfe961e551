//! Error types for compound file parsing.
//!
//! Every condition that invalidates the sector addressing scheme has its own
//! variant carrying the offending value and the bound it violated, so callers
//! can render a diagnostic without parsing a message string.
use thiserror::Error;

/// Error raised while opening a compound file or reading one of its streams.
#[derive(Error, Debug)]
pub enum OleError {
    /// IO error from the underlying byte source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Header
    #[error("Given file has an incomplete header ({file_size} bytes)")]
    IncompleteHeader { file_size: u64 },

    #[error("Not an OLE file")]
    NotOleFile,

    #[error("CLSID value in the file header is not zero")]
    IncorrectClsid,

    #[error("Incorrect DLL version {actual} in the file header, expected 3 or 4")]
    IncorrectDllVersion { actual: u16 },

    #[error("Big endian files are not supported")]
    BigEndianNotSupported,

    #[error("Incorrect sector size {actual} inferred from the file header, expected {expected}")]
    IncorrectSectorSize { actual: u64, expected: u64 },

    #[error("Incorrect mini sector size {actual} specified in the file header, expected {expected}")]
    IncorrectMiniSectorSize { actual: u64, expected: u64 },

    #[error("Incorrect reserved bytes in the file header, expected those to be zeros")]
    IncorrectHeaderReservedBytes,

    #[error("Incorrect number of directory sectors {actual} in the file header, expected {expected}")]
    IncorrectNumberOfDirectorySectors { actual: u32, expected: u32 },

    #[error("Incorrect mini stream cutoff size {actual} in the file header, expected {expected}")]
    IncorrectMiniStreamCutoffSize { actual: u32, expected: u32 },

    // Allocation tables
    #[error("No sector is available at byte offset {byte_offset}")]
    InvalidFatSector { byte_offset: u64 },

    #[error("Incorrect number of FAT sectors, expected more than {expected}, but got {actual}")]
    IncorrectNumberOfFatSectors { actual: u32, expected: u32 },

    #[error("Incorrect number of DIFAT sectors, expected {expected}, but got {actual}")]
    IncorrectNumberOfDifatSectors { actual: u32, expected: u32 },

    #[error("DIFAT sector index {actual} is out of bounds, expected it to be below {expected}")]
    SectorIndexInDifatOob { actual: u32, expected: u64 },

    #[error("MiniFAT holds {actual} entries, but the mini stream needs {expected}")]
    IncompleteMiniFat { actual: u64, expected: u64 },

    // Directory
    #[error("Incorrect storage type {actual} for directory entry {index}, expected 0..=5")]
    IncorrectStorageType { index: u32, actual: u8 },

    #[error("Incorrect color {actual} for directory entry {index}, expected 0 or 1")]
    IncorrectDirectoryEntryColor { index: u32, actual: u8 },

    #[error("Malformed name in directory entry {index}: name buffer length {byte_count}")]
    MalformedDirectoryEntryName { index: u32, byte_count: u16 },

    #[error("Incorrect root directory entry with type {actual}, expected type 5")]
    IncorrectRootEntry { actual: u8 },

    #[error("Directory stream contains no root entry")]
    MissingRootEntry,

    #[error("Duplicate root directory entry at index {index}")]
    DuplicateRootEntry { index: u32 },

    #[error("Directory entry index {actual} is out of range, expected it to be below {expected}")]
    DirectoryEntryIndexOob { actual: u32, expected: u32 },

    #[error("Directory entry {index} is referenced more than once in the tree")]
    DirectoryEntryCycle { index: u32 },

    #[error("Directory entry {index} has nonzero high size word {high:#x} on a 512-byte sector volume")]
    StreamSizeHighWordSet { index: u32, high: u32 },

    // Streams
    #[error("Incorrect sector index for an empty stream")]
    InvalidEmptyStream,

    #[error("Chain sector size must be nonzero")]
    ZeroSectorSize,

    #[error("Stream too large with {actual} sectors, the table only holds {expected}")]
    StreamTooLarge { actual: u64, expected: u64 },

    #[error("Sector {id} is out of the table bounds of {total} sectors")]
    InvalidSectorId { id: u32, total: u64 },

    #[error(
        "Incomplete stream starting at sector {first_sector}: expected {expected} bytes, got {actual}"
    )]
    IncompleteStream {
        first_sector: u32,
        actual: u64,
        expected: u64,
    },

    #[error("Directory entry \"{name}\" is not a stream")]
    DirectoryEntryIsNotAStream { name: String },

    // Lookup
    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    #[error("Directory entry \"{name}\" is not a storage")]
    NotAStorage { name: String },
}

/// Coarse classification of [`OleError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Header,
    AllocationTable,
    Directory,
    Stream,
    Lookup,
}

impl OleError {
    /// The layer that detected the error.
    pub fn category(&self) -> ErrorCategory {
        use OleError::*;
        match self {
            Io(_) => ErrorCategory::Io,
            IncompleteHeader { .. }
            | NotOleFile
            | IncorrectClsid
            | IncorrectDllVersion { .. }
            | BigEndianNotSupported
            | IncorrectSectorSize { .. }
            | IncorrectMiniSectorSize { .. }
            | IncorrectHeaderReservedBytes
            | IncorrectNumberOfDirectorySectors { .. }
            | IncorrectMiniStreamCutoffSize { .. } => ErrorCategory::Header,
            InvalidFatSector { .. }
            | IncorrectNumberOfFatSectors { .. }
            | IncorrectNumberOfDifatSectors { .. }
            | SectorIndexInDifatOob { .. }
            | IncompleteMiniFat { .. } => ErrorCategory::AllocationTable,
            IncorrectStorageType { .. }
            | IncorrectDirectoryEntryColor { .. }
            | MalformedDirectoryEntryName { .. }
            | IncorrectRootEntry { .. }
            | MissingRootEntry
            | DuplicateRootEntry { .. }
            | DirectoryEntryIndexOob { .. }
            | DirectoryEntryCycle { .. }
            | StreamSizeHighWordSet { .. } => ErrorCategory::Directory,
            InvalidEmptyStream
            | ZeroSectorSize
            | StreamTooLarge { .. }
            | InvalidSectorId { .. }
            | IncompleteStream { .. }
            | DirectoryEntryIsNotAStream { .. } => ErrorCategory::Stream,
            StreamNotFound(_) | NotAStorage { .. } => ErrorCategory::Lookup,
        }
    }
}

/// Result type for compound file operations.
pub type Result<T> = std::result::Result<T, OleError>;
