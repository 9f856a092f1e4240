//! Prefix-compressed entry keys.
//!
//! An entry flagged COMMON shares the first bytes of its key with the
//! page's external key (tag 0); only the remaining bytes are stored in the
//! entry itself. The reconstructed key is never longer than
//! [`MAX_KEY_SEGMENT`] bytes.

use crate::error::Result;
use crate::page::{KeyHeader, TaggedValue};

/// Upper bound on both the shared prefix and the reconstructed key
pub const MAX_KEY_SEGMENT: usize = 8;

/// A key rebuilt from an entry and its page's external key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    /// Prefix bytes followed by local bytes, at most 8 in total
    pub bytes: Vec<u8>,
    /// Offset inside the entry where the payload starts
    pub end_offset: usize,
}

impl Key {
    /// Rebuild the key of `value`.
    ///
    /// The prefix length is clamped to 8 and is copied from `external_key`
    /// only when the entry has the COMMON flag. The local bytes fill what
    /// is left of the 8-byte segment. Both parts are zero-padded when the
    /// source buffer is shorter than the declared size.
    pub fn parse(value: &TaggedValue, external_key: &[u8]) -> Result<Self> {
        let header = KeyHeader::read(value)?;

        let prefix_len = header
            .common_size
            .map_or(0, |size| (size as usize).min(MAX_KEY_SEGMENT));
        let suffix_len = (header.local_size as usize).min(MAX_KEY_SEGMENT - prefix_len);

        let mut bytes = Vec::with_capacity(prefix_len + suffix_len);
        bytes.extend(padded(external_key, prefix_len));

        let local = value.data.get(header.local_offset..).unwrap_or(&[]);
        bytes.extend(padded(local, suffix_len));

        Ok(Self {
            bytes,
            end_offset: header.end_offset(),
        })
    }

    /// Payload of the entry that follows the key
    pub fn payload<'a>(&self, value: &'a TaggedValue) -> &'a [u8] {
        value.data.get(self.end_offset..).unwrap_or(&[])
    }
}

fn padded(source: &[u8], len: usize) -> impl Iterator<Item = u8> + '_ {
    source
        .iter()
        .copied()
        .chain(std::iter::repeat(0))
        .take(len)
}
