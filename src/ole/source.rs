//! Random-access byte sources.
//!
//! The allocation table builders and the chain walker only need three
//! primitives: the total length, a bounded read at an absolute offset, and a
//! read from an offset to the end. Any `Read + Seek` value provides them, which
//! covers file handles, buffered readers and in-memory cursors alike.

use std::io::{self, Read, Seek, SeekFrom};

/// Random-access, read-only view of a compound file (or of the mini stream).
pub trait ByteSource {
    /// Total length of the source in bytes.
    fn byte_len(&mut self) -> io::Result<u64>;

    /// Append up to `len` bytes starting at `offset` to `out`.
    ///
    /// Returns the number of bytes appended. Reading past the end is not an
    /// error; it simply yields fewer bytes.
    fn read_at(&mut self, offset: u64, len: usize, out: &mut Vec<u8>) -> io::Result<usize>;

    /// Append every byte from `offset` to the end of the source to `out`.
    fn read_rest(&mut self, offset: u64, out: &mut Vec<u8>) -> io::Result<usize>;
}

impl<R: Read + Seek + ?Sized> ByteSource for R {
    fn byte_len(&mut self) -> io::Result<u64> {
        self.seek(SeekFrom::End(0))
    }

    fn read_at(&mut self, offset: u64, len: usize, out: &mut Vec<u8>) -> io::Result<usize> {
        self.seek(SeekFrom::Start(offset))?;
        Read::take(&mut *self, len as u64).read_to_end(out)
    }

    fn read_rest(&mut self, offset: u64, out: &mut Vec<u8>) -> io::Result<usize> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_to_end(out)
    }
}
