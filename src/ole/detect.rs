//! Application format detection from top-level entry names.
//!
//! Only the directory is consulted; stream contents are never decoded.

use super::file::OleFile;
use super::header::is_ole_file;
use std::io::{Cursor, Read, Seek};

/// Application format stored in a compound file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OleFormat {
    /// Word 97-2003 document
    Doc,
    /// Excel 5.0-2003 workbook
    Xls,
    /// PowerPoint 97-2003 presentation
    Ppt,
    /// Password-protected OOXML package wrapped in a compound file
    EncryptedOoxml,
    /// Outlook message
    Msg,
    /// A valid compound file with no recognized streams
    Unknown,
}

/// Identify the application format of an opened file.
pub fn detect_format<R: Read + Seek>(ole: &OleFile<R>) -> OleFormat {
    // Encrypted packages are checked first: they may carry other streams too
    if ole.exists(&["EncryptionInfo"]) && ole.exists(&["EncryptedPackage"]) {
        return OleFormat::EncryptedOoxml;
    }

    if ole.exists(&["WordDocument"]) {
        return OleFormat::Doc;
    }

    if ole.exists(&["Workbook"]) || ole.exists(&["Book"]) {
        return OleFormat::Xls;
    }

    if ole.exists(&["PowerPoint Document"]) {
        return OleFormat::Ppt;
    }

    if ole.exists(&["__properties_version1.0"]) {
        return OleFormat::Msg;
    }

    OleFormat::Unknown
}

/// Detect the format of an in-memory file.
///
/// Returns `None` when the data is not a readable compound file.
pub fn detect_format_from_bytes(bytes: &[u8]) -> Option<OleFormat> {
    if !is_ole_file(bytes) {
        return None;
    }

    match OleFile::open(Cursor::new(bytes)) {
        Ok(ole) => Some(detect_format(&ole)),
        Err(e) => {
            log::debug!("compound file signature present but open failed: {}", e);
            None
        },
    }
}
