//! Tag directory decoding.
//!
//! The tag directory grows backwards from the end of the page, four bytes
//! per tag: a 16-bit value size followed by a 16-bit value offset counted
//! from the end of the page header. Where the three tag flag bits live
//! depends on the file's layout, see [`FormatLayout::has_large_tags`].

use crate::error::{EseError, Result};
use crate::types::{read_u16, slice, FormatLayout, TAG_SIZE};
use bitflags::bitflags;

/// Mask for size/offset fields on small-page layouts
const SMALL_TAG_MASK: u16 = 0x1FFF;

/// Mask for size/offset fields on the large-page layout
const LARGE_TAG_MASK: u16 = 0x7FFF;

bitflags! {
    /// Flags attached to a tagged value
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TagFlags: u8 {
        const UNKNOWN = 0x1;
        const DEFUNCT = 0x2;
        /// The entry's key shares a prefix with the page's external key
        const COMMON = 0x4;
    }
}

/// One slot of a page: the value bytes plus its flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedValue {
    /// Index of the tag in the page's directory
    pub index: usize,
    /// Flags decoded for this layout
    pub flags: TagFlags,
    /// Value bytes, with any in-value flag bits already cleared
    pub data: Vec<u8>,
}

impl TaggedValue {
    /// Decode tag `index` from a full page buffer
    pub fn read(page: &[u8], index: usize, layout: &FormatLayout) -> Result<Self> {
        let tag_offset = layout
            .page_size
            .checked_sub(TAG_SIZE * (index + 1))
            .ok_or_else(|| EseError::truncated("tag directory", 0, TAG_SIZE, page.len()))?;
        let raw_size = read_u16(page, tag_offset, "tag directory")?;
        let raw_offset = read_u16(page, tag_offset + 2, "tag directory")?;
        let base = layout.page_header_size();

        if layout.has_large_tags() {
            let size = (raw_size & LARGE_TAG_MASK) as usize;
            let offset = (raw_offset & LARGE_TAG_MASK) as usize;
            let mut data = slice(page, base + offset, size, "tagged value")?.to_vec();

            let flags = match data.get_mut(1) {
                Some(b) => {
                    let flags = *b >> 5;
                    *b &= 0x1F;
                    flags
                }
                None => 0,
            };

            Ok(Self {
                index,
                flags: TagFlags::from_bits_retain(flags),
                data,
            })
        } else {
            let size = (raw_size & SMALL_TAG_MASK) as usize;
            let offset = (raw_offset & SMALL_TAG_MASK) as usize;
            let data = slice(page, base + offset, size, "tagged value")?.to_vec();

            Ok(Self {
                index,
                flags: TagFlags::from_bits_retain((raw_offset >> 13) as u8),
                data,
            })
        }
    }

    /// Check if the entry's key borrows a prefix from the page's external key
    pub fn has_common_key(&self) -> bool {
        self.flags.contains(TagFlags::COMMON)
    }
}
