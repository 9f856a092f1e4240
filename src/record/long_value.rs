//! Long-value lookup.
//!
//! Column values too large for a record live in the table's long-value
//! tree and the record stores a 4-byte LID instead. Each value is split
//! into segments keyed by the byte-swapped LID followed by a 4-byte segment
//! offset. Only the first segment (offset zero) of a value is resolved.

use crate::btree::PageWalker;
use crate::catalog::Table;
use crate::error::{EseError, Result};
use crate::storage::FileContext;
use crate::types::TraceConfig;
use std::collections::HashMap;
use tracing::debug;

/// Size of a long-value reference stored in a record
pub const LID_SIZE: usize = 4;

/// Long-value identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lid(pub u32);

impl Lid {
    /// Read a LID from the reference bytes stored in a record.
    ///
    /// The identifier is taken in the byte order it is stored in; the
    /// lookup key reverses it.
    pub fn from_reference(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; LID_SIZE] = bytes
            .get(..LID_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| EseError::truncated("long value reference", 0, LID_SIZE, bytes.len()))?;
        Ok(Self(u32::from_be_bytes(raw)))
    }

    /// Key of the first segment: the swapped LID then four zero bytes
    pub fn key(self) -> [u8; 8] {
        let mut key = [0u8; 8];
        key[..LID_SIZE].copy_from_slice(&self.0.swap_bytes().to_be_bytes());
        key
    }
}

/// Long-value segments of one table, keyed by their reconstructed key
#[derive(Debug, Clone, Default)]
pub struct LongValueIndex {
    segments: HashMap<Vec<u8>, Vec<u8>>,
}

impl LongValueIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk every long-value tree of `table` and index its entries
    pub fn build(ctx: &FileContext, table: &Table, trace: TraceConfig) -> Result<Self> {
        let mut index = Self::new();
        let mut walker = PageWalker::new(ctx, trace);

        for slot in table.long_values() {
            walker.walk(slot.root, |leaf| {
                let key = leaf.key()?;
                let payload = key.payload(leaf.value).to_vec();
                if trace.long_values {
                    debug!(
                        table = %table.name,
                        page = %leaf.page.id(),
                        key = ?key.bytes,
                        len = payload.len(),
                        "long value segment"
                    );
                }
                index.insert(key.bytes, payload);
                Ok(())
            })?;
        }

        debug!(table = %table.name, segments = index.len(), "long value index built");
        Ok(index)
    }

    /// Add one segment
    pub fn insert(&mut self, key: Vec<u8>, payload: Vec<u8>) {
        self.segments.insert(key, payload);
    }

    /// First segment of a long value, if present
    pub fn get(&self, lid: Lid) -> Option<&[u8]> {
        self.segments.get(lid.key().as_slice()).map(Vec::as_slice)
    }

    /// Number of indexed segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
