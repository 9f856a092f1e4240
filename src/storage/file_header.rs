//! Database file header.
//!
//! The first physical page of the file holds the database header, the
//! second a shadow copy of it. Only the fields the reader needs are decoded.

use crate::error::{EseError, Result};
use crate::types::{read_u32, FormatLayout, ESE_SIGNATURE, SUPPORTED_PAGE_SIZES};

/// Minimum bytes needed to decode every field below
pub const FILE_HEADER_SIZE: usize = 240;

/// Database state recorded at the last shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseState {
    JustCreated,
    DirtyShutdown,
    CleanShutdown,
    BeingConverted,
    ForceDetach,
    Unknown(u32),
}

impl DatabaseState {
    /// Convert from the raw header value
    pub fn from_raw(value: u32) -> Self {
        match value {
            1 => Self::JustCreated,
            2 => Self::DirtyShutdown,
            3 => Self::CleanShutdown,
            4 => Self::BeingConverted,
            5 => Self::ForceDetach,
            other => Self::Unknown(other),
        }
    }
}

/// Database file header
///
/// Layout (little-endian):
/// ```text
/// Offset  Size  Description
/// 0       4     Checksum
/// 4       4     Signature 0x89abcdef
/// 8       4     Format version
/// 12      4     File type
/// 52      4     Database state
/// 232     4     Format revision
/// 236     4     Page size
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FileHeader {
    /// Header checksum, kept for display only
    pub checksum: u32,
    /// File format version
    pub format_version: u32,
    /// 0 for a database, 1 for a streaming file
    pub file_type: u32,
    /// State at last shutdown
    pub database_state: DatabaseState,
    /// File format revision
    pub format_revision: u32,
    /// Page size in bytes
    pub page_size: u32,
}

impl FileHeader {
    /// Read a file header from bytes
    pub fn read(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FILE_HEADER_SIZE {
            return Err(EseError::format("header too short"));
        }

        let signature = read_u32(bytes, 4, "file header")?;
        if signature != ESE_SIGNATURE {
            return Err(EseError::format(format!(
                "bad signature {:#010x}, expected {:#010x}",
                signature, ESE_SIGNATURE
            )));
        }

        let page_size = read_u32(bytes, 236, "file header")?;
        if !SUPPORTED_PAGE_SIZES.contains(&(page_size as usize)) {
            return Err(EseError::format(format!("unsupported page size: {}", page_size)));
        }

        Ok(Self {
            checksum: read_u32(bytes, 0, "file header")?,
            format_version: read_u32(bytes, 8, "file header")?,
            file_type: read_u32(bytes, 12, "file header")?,
            database_state: DatabaseState::from_raw(read_u32(bytes, 52, "file header")?),
            format_revision: read_u32(bytes, 232, "file header")?,
            page_size,
        })
    }

    /// The layout values every page of this file is read with
    pub fn layout(&self) -> FormatLayout {
        FormatLayout::new(self.format_version, self.format_revision, self.page_size as usize)
    }
}
