//! Page identifier type.

use serde::Serialize;
use std::fmt;

/// Logical page number inside an ESE database file.
///
/// Logical page numbers start at 1. The first two physical pages of the
/// file hold the database header and its shadow copy, so logical page `n`
/// lives at physical block `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct PageId(pub u32);

impl PageId {
    /// Sentinel used by the format for "no page"
    pub const NONE: PageId = PageId(0);

    /// Root page of the catalog (MSysObjects)
    pub const CATALOG: PageId = PageId(4);

    /// Create a new page ID
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw page number
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Check if this refers to a real page
    pub const fn is_valid(self) -> bool {
        self.0 != 0 && self.0 != u32::MAX
    }

    /// Byte offset of this page in the file, skipping the two header blocks
    pub const fn file_offset(self, page_size: usize) -> u64 {
        (self.0 as u64 + 1) * page_size as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PageId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<PageId> for u32 {
    fn from(id: PageId) -> Self {
        id.0
    }
}
