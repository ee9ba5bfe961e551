/// Constants for OLE file format
pub mod consts;

/// Decoded sector pointers and allocation table values
pub mod sector;

/// Error types
pub mod error;

/// Random-access byte sources
pub mod source;

/// Header decoding and validation
pub mod header;

/// Sector chain walker shared by the FAT and the MiniFAT
pub mod stream;

/// FAT construction, including the DIFAT chain
pub mod fat;

/// MiniFAT construction
mod minifat;

/// Directory stream decoding and tree construction
pub mod directory;

/// Open options
mod options;

/// Main OLE file handle
mod file;

/// Application format detection
pub mod detect;

#[cfg(test)]
mod test_support;


// Re-export public types for convenient access
pub use detect::{OleFormat, detect_format, detect_format_from_bytes};
pub use directory::{DirectoryEntry, EntryKind, NodeColor, parse_directory};
pub use error::{ErrorCategory, OleError, Result};
pub use fat::AllocationTable;
pub use file::OleFile;
pub use header::{Header, is_ole_file};
pub use options::OpenOptions;
pub use sector::SectorId;
pub use source::ByteSource;
pub use stream::{ChainRequest, read_chain};
