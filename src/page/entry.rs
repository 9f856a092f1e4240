//! Leaf and branch entry decoding.
//!
//! Both entry kinds start with the same key header:
//! ```text
//! [common key size: u16]   only when the tag has the COMMON flag
//! local key size: u16
//! local key: [u8; local key size]
//! ```
//! A leaf entry's payload follows the key; a branch entry is followed by
//! the 32-bit number of its child page.

use crate::error::Result;
use crate::page::TaggedValue;
use crate::types::{read_u16, read_u32, slice, PageId};

/// The key header shared by leaf and branch entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHeader {
    /// Bytes shared with the page's external key, if the entry is compressed
    pub common_size: Option<u16>,
    /// Bytes stored in the entry itself
    pub local_size: u16,
    /// Offset of the local key bytes
    pub local_offset: usize,
}

impl KeyHeader {
    /// Decode the key header of a tagged value
    pub fn read(value: &TaggedValue) -> Result<Self> {
        let mut offset = 0;
        let common_size = if value.has_common_key() {
            let size = read_u16(&value.data, 0, "entry key header")?;
            offset += 2;
            Some(size)
        } else {
            None
        };

        let local_size = read_u16(&value.data, offset, "entry key header")?;
        offset += 2;

        Ok(Self {
            common_size,
            local_size,
            local_offset: offset,
        })
    }

    /// Offset just past the local key, where the entry payload starts
    pub fn end_offset(&self) -> usize {
        self.local_offset + self.local_size as usize
    }
}

/// A leaf entry: key plus the entry payload
#[derive(Debug, Clone)]
pub struct LeafEntry<'a> {
    /// Decoded key header
    pub key: KeyHeader,
    /// Local key bytes
    pub local_key: &'a [u8],
    /// Payload after the key
    pub data: &'a [u8],
}

impl<'a> LeafEntry<'a> {
    /// Decode a leaf entry
    pub fn parse(value: &'a TaggedValue) -> Result<Self> {
        let key = KeyHeader::read(value)?;
        let local_key = slice(&value.data, key.local_offset, key.local_size as usize, "leaf key")?;
        Ok(Self {
            key,
            local_key,
            data: &value.data[key.end_offset()..],
        })
    }
}

/// A branch entry: separator key plus child page pointer
#[derive(Debug, Clone)]
pub struct BranchEntry<'a> {
    /// Decoded key header
    pub key: KeyHeader,
    /// Local separator key bytes
    pub local_key: &'a [u8],
    /// Child page this entry points to
    pub child: PageId,
}

impl<'a> BranchEntry<'a> {
    /// Decode a branch entry
    pub fn parse(value: &'a TaggedValue) -> Result<Self> {
        let key = KeyHeader::read(value)?;
        let local_key = slice(&value.data, key.local_offset, key.local_size as usize, "branch key")?;
        let child = read_u32(&value.data, key.end_offset(), "branch child")?;
        Ok(Self {
            key,
            local_key,
            child: PageId::new(child),
        })
    }
}
