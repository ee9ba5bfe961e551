//! cfbf-reader - A Rust library for reading Compound File Binary Format files
//!
//! Compound files (also known as OLE2 or structured storage) are small file
//! systems inside a single file: a header, File Allocation Tables, a directory
//! tree of storages and streams, and a mini stream for small streams. Legacy
//! Office documents (.doc, .xls, .ppt), Outlook messages and encrypted OOXML
//! packages all use this container.
//!
//! # Features
//!
//! - **Validated header**: every header field is checked before any table is read
//! - **FAT/DIFAT/MiniFAT**: allocation tables decoded once, into typed sector ids
//! - **Directory tree**: link tree kept as written, storage members in sibling order, cycles rejected
//! - **Stream reads**: exact-size reconstruction through either table
//! - **Shared handles**: `OleFile` is `Send + Sync` for `Send` readers
//!
//! # Example - Listing and reading streams
//!
//! ```no_run
//! use cfbf_reader::OleFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ole = OleFile::open_path("document.doc")?;
//!
//! for path in ole.list_streams() {
//!     println!("{}", path.join("/"));
//! }
//!
//! let data = ole.open_stream(&["WordDocument"])?;
//! println!("WordDocument: {} bytes", data.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Walking the directory tree
//!
//! ```no_run
//! use cfbf_reader::OleFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ole = OleFile::from_bytes(std::fs::read("message.msg")?)?;
//!
//! for entry in ole.root().walk() {
//!     if entry.is_stream() {
//!         let data = ole.read_stream(entry)?;
//!         println!("{:>8} {}", data.len(), entry.name);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// Compound file reader
pub mod ole;

pub use ole::{
    DirectoryEntry, EntryKind, OleError, OleFile, OleFormat, OpenOptions, Result, SectorId,
    detect_format, is_ole_file,
};
