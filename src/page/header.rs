//! Page header structure.
//!
//! Every database page starts with a fixed header. Pages larger than 8 KiB
//! carry 40 extra bytes (extended checksums and the page number) that the
//! reader skips.

use crate::error::Result;
use crate::types::{read_u16, read_u32, PageId, PAGE_HEADER_SIZE};
use bitflags::bitflags;

bitflags! {
    /// Page flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PageFlags: u32 {
        const ROOT = 0x0000_0001;
        const LEAF = 0x0000_0002;
        const PARENT = 0x0000_0004;
        const EMPTY = 0x0000_0008;
        const SPACE_TREE = 0x0000_0020;
        const INDEX = 0x0000_0040;
        const LONG_VALUE = 0x0000_0080;
        const NEW_RECORD_FORMAT = 0x0000_2000;
        const SCRUBBED = 0x0000_4000;
    }
}

/// Page header structure
///
/// Layout:
/// ```text
/// Offset  Size  Description
/// 0       8     Checksum (and page number on old formats)
/// 8       8     Database modification time
/// 16      4     Previous page number
/// 20      4     Next page number
/// 24      4     Father data page object id
/// 28      2     Available data size
/// 30      2     Available uncommitted data size
/// 32      2     First available data offset
/// 34      2     Tag count (first available page tag)
/// 36      4     Page flags
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PageHeader {
    /// Previous sibling in the leaf chain
    pub previous_page: PageId,
    /// Next sibling in the leaf chain
    pub next_page: PageId,
    /// Object id of the tree owning this page
    pub father_object_id: u32,
    /// Free bytes on the page
    pub available_data_size: u16,
    /// Offset of the first free byte after the header
    pub first_available_offset: u16,
    /// Number of tags in the tag directory
    pub tag_count: u16,
    /// Page flags
    pub flags: PageFlags,
}

impl PageHeader {
    /// Read a page header from the start of a page
    pub fn read(bytes: &[u8]) -> Result<Self> {
        let what = "page header";
        // Force the whole fixed header to be present before decoding fields
        crate::types::slice(bytes, 0, PAGE_HEADER_SIZE, what)?;

        Ok(Self {
            previous_page: PageId::new(read_u32(bytes, 16, what)?),
            next_page: PageId::new(read_u32(bytes, 20, what)?),
            father_object_id: read_u32(bytes, 24, what)?,
            available_data_size: read_u16(bytes, 28, what)?,
            first_available_offset: read_u16(bytes, 32, what)?,
            tag_count: read_u16(bytes, 34, what)?,
            flags: PageFlags::from_bits_retain(read_u32(bytes, 36, what)?),
        })
    }

    /// Check if this is a leaf page
    pub fn is_leaf(&self) -> bool {
        self.flags.contains(PageFlags::LEAF)
    }

    /// Check if this is a branch page (anything that is not a leaf)
    pub fn is_branch(&self) -> bool {
        !self.is_leaf()
    }

    /// Check if this page is the root of its tree
    pub fn is_root(&self) -> bool {
        self.flags.contains(PageFlags::ROOT)
    }

    /// Check if this page holds table rows rather than index, space or
    /// long-value entries
    pub fn holds_records(&self) -> bool {
        !self
            .flags
            .intersects(PageFlags::SPACE_TREE | PageFlags::INDEX | PageFlags::LONG_VALUE)
    }
}
