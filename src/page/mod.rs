//! Page layer: one decoded database page.
//!
//! A page is a fixed-size block laid out as:
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │            Page Header (40 or 80 bytes)             │
//! ├────────────────────────────────────────────────────┤
//! │  Tag values  [tag0][tag1][tag2]...  →              │
//! │                                                    │
//! │                   Free Space                        │
//! │                                                    │
//! │                ←  [tag2][tag1][tag0]               │
//! │                   Tag Directory                     │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Tag 0 is the page's external header (the key prefix shared by entries
//! flagged COMMON); the data entries start at tag 1.

mod entry;
mod header;
mod tag;

pub use entry::{BranchEntry, KeyHeader, LeafEntry};
pub use header::{PageFlags, PageHeader};
pub use tag::{TagFlags, TaggedValue};

use crate::error::Result;
use crate::types::{FormatLayout, PageId};

/// A page read from the file, with its header decoded
#[derive(Debug, Clone)]
pub struct Page {
    id: PageId,
    header: PageHeader,
    layout: FormatLayout,
    data: Vec<u8>,
}

impl Page {
    /// Decode a page from its raw bytes
    pub fn from_bytes(id: PageId, layout: FormatLayout, data: Vec<u8>) -> Result<Self> {
        let header = PageHeader::read(&data)?;
        Ok(Self {
            id,
            header,
            layout,
            data,
        })
    }

    /// Logical page number
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Decoded page header
    pub fn header(&self) -> &PageHeader {
        &self.header
    }

    /// Raw page bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of tags on this page
    pub fn tag_count(&self) -> usize {
        self.header.tag_count as usize
    }

    /// Decode one tag
    pub fn tag(&self, index: usize) -> Result<TaggedValue> {
        TaggedValue::read(&self.data, index, &self.layout)
    }

    /// Decode every tag, external header first
    pub fn values(&self) -> Result<Vec<TaggedValue>> {
        (0..self.tag_count()).map(|i| self.tag(i)).collect()
    }
}
