//! Common types used throughout the reader.

mod guid;
mod le;
mod page_id;

pub use guid::format_guid;
pub use le::{read_u16, read_u32, read_u64, read_u8, slice};
pub use page_id::PageId;

use serde::{Deserialize, Serialize};

/// Signature stored at offset 4 of the file header
pub const ESE_SIGNATURE: u32 = 0x89AB_CDEF;

/// Page sizes the reader accepts
pub const SUPPORTED_PAGE_SIZES: [usize; 4] = [4096, 8192, 16384, 32768];

/// Format version shared by every Windows release since XP SP1
pub const FORMAT_VERSION_WIN7: u32 = 0x620;

/// First format revision with the large-page tag layout (Windows 7)
pub const FORMAT_REVISION_EXTENDED_PAGE: u32 = 0x11;

/// Page header size before any extension
pub const PAGE_HEADER_SIZE: usize = 40;

/// Extra header bytes present on pages larger than 8 KiB
pub const EXTENDED_PAGE_HEADER_SIZE: usize = 40;

/// Size of one tag directory entry
pub const TAG_SIZE: usize = 4;

/// The three values that decide how every page of a file is interpreted.
///
/// They come from the file header once per open and are copied into every
/// page view, so nothing downstream ever re-derives them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatLayout {
    /// File format version (`0x620` for everything modern)
    pub version: u32,
    /// File format revision
    pub revision: u32,
    /// Page size in bytes
    pub page_size: usize,
}

impl FormatLayout {
    /// Create a layout from header values
    pub const fn new(version: u32, revision: u32, page_size: usize) -> Self {
        Self {
            version,
            revision,
            page_size,
        }
    }

    /// Whether tag flags live in the value instead of the tag offset.
    ///
    /// Windows 7 and later files with pages over 8 KiB use 15-bit tag
    /// offsets, leaving no room for the flag bits in the tag itself.
    pub const fn has_large_tags(&self) -> bool {
        self.version == FORMAT_VERSION_WIN7
            && self.revision >= FORMAT_REVISION_EXTENDED_PAGE
            && self.page_size > 8192
    }

    /// Size of the page header for this page size
    pub const fn page_header_size(&self) -> usize {
        if self.page_size > 8192 {
            PAGE_HEADER_SIZE + EXTENDED_PAGE_HEADER_SIZE
        } else {
            PAGE_HEADER_SIZE
        }
    }
}

/// Switches for verbose tracing output.
///
/// Every flag maps to `tracing::debug!` events; the events are only emitted
/// when the matching flag is on, so a subscriber at debug level is not
/// flooded by page dumps unless asked for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraceConfig {
    /// Trace every page visited by a walk
    pub pages: bool,
    /// Trace every catalog record decoded
    pub catalog: bool,
    /// Trace long-value index construction
    pub long_values: bool,
}

impl TraceConfig {
    /// All tracing switched on
    pub fn verbose() -> Self {
        Self {
            pages: true,
            catalog: true,
            long_values: true,
        }
    }
}

/// Column data types (`JET_coltyp*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Nil,
    Bit,
    UnsignedByte,
    Short,
    Long,
    Currency,
    IeeeSingle,
    IeeeDouble,
    DateTime,
    Binary,
    Text,
    LongBinary,
    LongText,
    Slv,
    UnsignedLong,
    LongLong,
    Guid,
    UnsignedShort,
    /// A type code this reader does not know
    Other(u32),
}

impl ColumnType {
    /// Convert from the catalog's numeric type code
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Nil,
            1 => Self::Bit,
            2 => Self::UnsignedByte,
            3 => Self::Short,
            4 => Self::Long,
            5 => Self::Currency,
            6 => Self::IeeeSingle,
            7 => Self::IeeeDouble,
            8 => Self::DateTime,
            9 => Self::Binary,
            10 => Self::Text,
            11 => Self::LongBinary,
            12 => Self::LongText,
            13 => Self::Slv,
            14 => Self::UnsignedLong,
            15 => Self::LongLong,
            16 => Self::Guid,
            17 => Self::UnsignedShort,
            other => Self::Other(other),
        }
    }

    /// Width in bytes for types with a fixed encoding
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Bit | Self::UnsignedByte => Some(1),
            Self::Short | Self::UnsignedShort => Some(2),
            Self::Long | Self::UnsignedLong | Self::IeeeSingle => Some(4),
            Self::Currency | Self::IeeeDouble | Self::DateTime | Self::LongLong => Some(8),
            Self::Guid => Some(16),
            _ => None,
        }
    }

    /// Check if values of this type are text
    pub fn is_text(self) -> bool {
        matches!(self, Self::Text | Self::LongText)
    }
}
