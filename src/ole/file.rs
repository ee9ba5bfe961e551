//! Top-level compound file handle.

use super::consts::HEADER_SIZE;
use super::directory::{DirectoryEntry, parse_directory_with};
use super::error::{OleError, Result};
use super::fat::AllocationTable;
use super::header::Header;
use super::options::OpenOptions;
use super::source::ByteSource;
use super::stream::{ChainRequest, read_chain};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

/// Main OLE file parser structure
///
/// Opening a file validates the header, loads the FAT and the MiniFAT and
/// builds the directory tree. Streams are read on demand. The handle can be
/// shared between threads: reads from the underlying source are serialized
/// and the mini stream is materialized at most once.
#[derive(Debug)]
pub struct OleFile<R> {
    source: Mutex<R>,
    header: Header,
    fat: AllocationTable,
    mini_fat: AllocationTable,
    root: DirectoryEntry,
    options: OpenOptions,
    /// Contents of the root entry's stream, read on first small-stream access
    mini_stream: OnceCell<Vec<u8>>,
}

impl<R: Read + Seek> OleFile<R> {
    /// Open and parse an OLE file from a reader
    ///
    /// # Arguments
    /// * `reader` - A reader that implements Read + Seek
    pub fn open(reader: R) -> Result<Self> {
        Self::open_with_options(reader, OpenOptions::default())
    }

    /// Open and parse an OLE file with explicit options.
    pub fn open_with_options(mut reader: R, options: OpenOptions) -> Result<Self> {
        let file_size = reader.byte_len()?;
        let mut first_sector = Vec::with_capacity(HEADER_SIZE);
        reader.read_at(0, HEADER_SIZE, &mut first_sector)?;
        let header = Header::parse(&first_sector, file_size)?;

        let fat = AllocationTable::build(&header, &mut reader)?;

        let dir_request = ChainRequest::new(
            header.first_dir_sector,
            None,
            header.sector_size,
            header.sector_size,
        );
        let dir_bytes = read_chain(&mut reader, fat.entries(), &dir_request)?;
        let root = parse_directory_with(&dir_bytes, header.sector_size, options.strict_stream_size)?;

        let mini_fat = AllocationTable::build_mini(&header, root.stream_size, &fat, &mut reader)?;

        log::debug!(
            "opened compound file: {} FAT entries, {} MiniFAT entries, {} top-level entries",
            fat.len(),
            mini_fat.len(),
            root.members().len()
        );

        Ok(OleFile {
            source: Mutex::new(reader),
            header,
            fat,
            mini_fat,
            root,
            options,
            mini_stream: OnceCell::new(),
        })
    }

    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[inline]
    pub fn fat(&self) -> &AllocationTable {
        &self.fat
    }

    #[inline]
    pub fn mini_fat(&self) -> &AllocationTable {
        &self.mini_fat
    }

    /// The root entry; every other reachable entry hangs below it.
    #[inline]
    pub fn root(&self) -> &DirectoryEntry {
        &self.root
    }

    #[inline]
    pub fn options(&self) -> &OpenOptions {
        &self.options
    }

    /// Total file size in bytes
    #[inline]
    pub fn file_size(&self) -> u64 {
        self.header.file_size
    }

    /// Read the full contents of a stream entry.
    ///
    /// Streams below the mini stream cutoff live in the mini stream and are
    /// addressed through the MiniFAT; larger ones are read through the FAT.
    pub fn read_stream(&self, entry: &DirectoryEntry) -> Result<Vec<u8>> {
        if !entry.is_stream() {
            return Err(OleError::DirectoryEntryIsNotAStream {
                name: entry.name.clone(),
            });
        }

        let allow_empty = self.options.allow_empty_streams;
        if entry.stream_size < u64::from(self.header.mini_stream_cutoff) {
            let mini_stream = self.mini_stream()?;
            let request = ChainRequest::new(
                entry.start_sector,
                Some(entry.stream_size),
                0,
                self.header.mini_sector_size,
            )
            .allow_empty(allow_empty);
            read_chain(&mut Cursor::new(mini_stream), self.mini_fat.entries(), &request)
        } else {
            let request = ChainRequest::new(
                entry.start_sector,
                Some(entry.stream_size),
                self.header.sector_size,
                self.header.sector_size,
            )
            .allow_empty(allow_empty);
            let mut source = self.source.lock();
            read_chain(&mut *source, self.fat.entries(), &request)
        }
    }

    /// The mini stream, read through the FAT from the root entry on first use.
    fn mini_stream(&self) -> Result<&[u8]> {
        self.mini_stream
            .get_or_try_init(|| {
                let request = ChainRequest::new(
                    self.root.start_sector,
                    Some(self.root.stream_size),
                    self.header.sector_size,
                    self.header.sector_size,
                )
                .allow_empty(true);
                let mut source = self.source.lock();
                let data = read_chain(&mut *source, self.fat.entries(), &request)?;
                log::debug!("mini stream materialized: {} bytes", data.len());
                Ok(data)
            })
            .map(Vec::as_slice)
    }

    /// Find a directory entry by path
    ///
    /// An empty path designates the root entry. Each component is looked up
    /// among the members of the storage reached so far, so entries linked as
    /// peers of a sibling are found at their storage's level.
    pub fn find_entry(&self, path: &[&str]) -> Result<&DirectoryEntry> {
        let case_sensitive = self.options.case_sensitive_names;
        let mut current = &self.root;
        for name in path {
            current = current
                .child(name, case_sensitive)
                .ok_or_else(|| OleError::StreamNotFound(path.join("/")))?;
        }
        Ok(current)
    }

    /// Check if a stream or storage exists
    pub fn exists(&self, path: &[&str]) -> bool {
        self.find_entry(path).is_ok()
    }

    /// Check if a storage exists at the given path
    pub fn directory_exists(&self, path: &[&str]) -> bool {
        self.find_entry(path).is_ok_and(DirectoryEntry::is_storage)
    }

    /// Open a stream by path and return its contents
    ///
    /// # Arguments
    /// * `path` - Path to the stream as a slice of strings
    pub fn open_stream(&self, path: &[&str]) -> Result<Vec<u8>> {
        let entry = self.find_entry(path)?;
        self.read_stream(entry)
    }

    /// List all streams in the OLE file
    ///
    /// Returns a list of stream paths (as vectors of storage/stream names),
    /// depth first, members of each storage in sibling order.
    pub fn list_streams(&self) -> Vec<Vec<String>> {
        let mut streams = Vec::new();
        let mut pending: Vec<(&DirectoryEntry, Vec<String>)> = self
            .root
            .members()
            .into_iter()
            .rev()
            .map(|c| (c, Vec::new()))
            .collect();

        while let Some((entry, mut path)) = pending.pop() {
            path.push(entry.name.clone());
            if entry.is_stream() {
                streams.push(path);
            } else if entry.is_storage() {
                pending.extend(entry.members().into_iter().rev().map(|c| (c, path.clone())));
            }
        }
        streams
    }

    /// List all entries (streams and storages) in a storage
    ///
    /// # Arguments
    /// * `path` - Path to the storage (empty for root)
    pub fn list_directory_entries(&self, path: &[&str]) -> Result<Vec<&DirectoryEntry>> {
        let entry = self.find_entry(path)?;
        if !entry.is_storage() {
            return Err(OleError::NotAStorage {
                name: entry.name.clone(),
            });
        }
        Ok(entry.members())
    }

    /// Consume the handle and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }
}

impl OleFile<BufReader<File>> {
    /// Open a compound file from disk.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_path_with_options(path, OpenOptions::default())
    }

    pub fn open_path_with_options<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Self> {
        let file = File::open(path)?;
        Self::open_with_options(BufReader::new(file), options)
    }
}

impl OleFile<Cursor<Vec<u8>>> {
    /// Open a compound file held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::open(Cursor::new(data))
    }
}
