//! Depth-first tree traversal.
//!
//! A walk starts at a root page and visits every entry below it in page
//! order. For each page of a leaf chain:
//! 1. Stop if the page has no tags
//! 2. Skip tag 0, the page's external key
//! 3. Leaf entries go to the callback; branch entries are descended into
//! 4. Continue with the page's next sibling
//!
//! Each page id is visited at most once per walker, which also guarantees
//! termination on files whose page pointers form a cycle.

use crate::btree::Key;
use crate::error::{EseError, Result};
use crate::page::{BranchEntry, Page, TaggedValue};
use crate::storage::FileContext;
use crate::types::{PageId, TraceConfig};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Deepest branch nesting a walk accepts before calling the file corrupt
pub const MAX_TREE_DEPTH: usize = 64;

/// A leaf entry handed to the walk callback
#[derive(Debug, Clone, Copy)]
pub struct LeafValue<'a> {
    /// Page the entry was found on
    pub page: &'a Page,
    /// The page's external key (tag 0), empty if the page has none
    pub external_key: &'a [u8],
    /// The entry itself
    pub value: &'a TaggedValue,
}

impl LeafValue<'_> {
    /// Rebuild the entry's key against the page's external key
    pub fn key(&self) -> Result<Key> {
        Key::parse(self.value, self.external_key)
    }
}

/// Walks one or more trees, sharing a visited set between them.
///
/// Use a fresh walker for every independent walk; walkers are cheap and
/// are never shared between threads.
pub struct PageWalker<'a> {
    ctx: &'a FileContext,
    trace: TraceConfig,
    visited: HashSet<PageId>,
}

impl<'a> PageWalker<'a> {
    /// Create a walker over `ctx`
    pub fn new(ctx: &'a FileContext, trace: TraceConfig) -> Self {
        Self {
            ctx,
            trace,
            visited: HashSet::new(),
        }
    }

    /// Number of distinct pages visited so far
    pub fn visited(&self) -> usize {
        self.visited.len()
    }

    /// Walk the tree rooted at `root`, calling `on_leaf` for every leaf entry.
    ///
    /// The first error returned by `on_leaf` stops the walk and is returned
    /// as is; [`EseError::Cancelled`] is the conventional way to stop early.
    pub fn walk<F>(&mut self, root: PageId, mut on_leaf: F) -> Result<()>
    where
        F: FnMut(LeafValue<'_>) -> Result<()>,
    {
        self.walk_chain(root, 0, &mut on_leaf)
    }

    fn walk_chain<F>(&mut self, start: PageId, depth: usize, on_leaf: &mut F) -> Result<()>
    where
        F: FnMut(LeafValue<'_>) -> Result<()>,
    {
        if depth > MAX_TREE_DEPTH {
            return Err(EseError::format(format!(
                "tree below page {} is deeper than {} levels",
                start, MAX_TREE_DEPTH
            )));
        }

        let mut next = start;
        while next.is_valid() {
            if !self.visited.insert(next) {
                trace!(page = %next, "page already visited");
                break;
            }

            let page = self.ctx.read_page(next)?;
            let header = *page.header();
            if self.trace.pages {
                debug!(
                    page = %next,
                    depth,
                    tags = header.tag_count,
                    flags = ?header.flags,
                    next = %header.next_page,
                    "visiting page"
                );
            }

            let values = page.values()?;
            let Some((external, entries)) = values.split_first() else {
                break;
            };

            for value in entries {
                if header.is_leaf() {
                    on_leaf(LeafValue {
                        page: &page,
                        external_key: &external.data,
                        value,
                    })?;
                } else {
                    let entry = BranchEntry::parse(value)?;
                    self.walk_chain(entry.child, depth + 1, on_leaf)?;
                }
            }

            next = header.next_page;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{EseFileBuilder, PageBuilder};
    use crate::page::{LeafEntry, PageFlags};
    use crate::types::FormatLayout;

    fn collect(ctx: &FileContext, root: u32) -> Result<(Vec<Vec<u8>>, usize)> {
        let mut walker = PageWalker::new(ctx, TraceConfig::verbose());
        let mut seen = Vec::new();
        walker.walk(PageId::new(root), |leaf| {
            seen.push(LeafEntry::parse(leaf.value)?.data.to_vec());
            Ok(())
        })?;
        Ok((seen, walker.visited()))
    }

    #[test]
    fn test_walk_branch_and_chain_in_page_order() -> Result<()> {
        let layout = FormatLayout::new(0x620, 0x11, 4096);
        let bytes = EseFileBuilder::new(layout)
            .page(
                5,
                PageBuilder::branch()
                    .flags(PageFlags::ROOT)
                    .child(&[0x10], 6)
                    .child(&[0x20], 8),
            )
            .page(6, PageBuilder::leaf().next_page(7).leaf_entry(&[0x01], b"a"))
            .page(7, PageBuilder::leaf().leaf_entry(&[0x02], b"b").leaf_entry(&[0x03], b"c"))
            .page(8, PageBuilder::leaf().leaf_entry(&[0x04], b"d"))
            .build();
        let ctx = FileContext::new(Box::new(bytes))?;

        let (seen, visited) = collect(&ctx, 5)?;
        assert_eq!(seen, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]);
        assert_eq!(visited, 4);
        Ok(())
    }

    #[test]
    fn test_walk_terminates_on_cycles() -> Result<()> {
        let layout = FormatLayout::new(0x620, 0x11, 4096);
        let bytes = EseFileBuilder::new(layout)
            // Branch pointing at itself and at a leaf chain that loops
            .page(5, PageBuilder::branch().child(&[0x01], 5).child(&[0x02], 6))
            .page(6, PageBuilder::leaf().next_page(7).leaf_entry(&[0x01], b"x"))
            .page(7, PageBuilder::leaf().next_page(6).leaf_entry(&[0x02], b"y"))
            .build();
        let ctx = FileContext::new(Box::new(bytes))?;

        let (seen, visited) = collect(&ctx, 5)?;
        assert_eq!(seen, vec![b"x".to_vec(), b"y".to_vec()]);
        assert_eq!(visited, 3);
        Ok(())
    }

    #[test]
    fn test_empty_page_stops_chain() -> Result<()> {
        let layout = FormatLayout::new(0x620, 0x11, 4096);
        let bytes = EseFileBuilder::new(layout)
            .page(5, PageBuilder::leaf().no_tags().next_page(6))
            .page(6, PageBuilder::leaf().leaf_entry(&[0x01], b"unreached"))
            .build();
        let ctx = FileContext::new(Box::new(bytes))?;

        let (seen, visited) = collect(&ctx, 5)?;
        assert!(seen.is_empty());
        assert_eq!(visited, 1);
        Ok(())
    }

    #[test]
    fn test_callback_error_stops_walk() -> Result<()> {
        let layout = FormatLayout::new(0x620, 0x11, 4096);
        let bytes = EseFileBuilder::new(layout)
            .page(
                5,
                PageBuilder::leaf()
                    .next_page(6)
                    .leaf_entry(&[0x01], b"a")
                    .leaf_entry(&[0x02], b"b"),
            )
            .page(6, PageBuilder::leaf().leaf_entry(&[0x03], b"c"))
            .build();
        let ctx = FileContext::new(Box::new(bytes))?;

        let mut calls = 0;
        let mut walker = PageWalker::new(&ctx, TraceConfig::default());
        let result = walker.walk(PageId::new(5), |_| {
            calls += 1;
            Err(EseError::Cancelled)
        });

        assert!(matches!(result, Err(EseError::Cancelled)));
        assert_eq!(calls, 1);
        assert_eq!(walker.visited(), 1);
        Ok(())
    }

    #[test]
    fn test_leaf_value_key_uses_external_key() -> Result<()> {
        let layout = FormatLayout::new(0x620, 0x14, 16384);
        let bytes = EseFileBuilder::new(layout)
            .page(
                5,
                PageBuilder::leaf()
                    .external_key(&[0xAA, 0x0B])
                    .common_leaf_entry(2, &[0x01], b"v"),
            )
            .build();
        let ctx = FileContext::new(Box::new(bytes))?;

        let mut keys = Vec::new();
        PageWalker::new(&ctx, TraceConfig::default()).walk(PageId::new(5), |leaf| {
            keys.push(leaf.key()?.bytes);
            Ok(())
        })?;
        assert_eq!(keys, vec![vec![0xAA, 0x0B, 0x01]]);
        Ok(())
    }

    #[test]
    fn test_corrupt_tag_fails_walk() -> Result<()> {
        let layout = FormatLayout::new(0x620, 0x11, 4096);
        let mut page = PageBuilder::leaf().leaf_entry(&[0x01], b"a").encode(&layout);
        // Tag 1 claims 0xFFF bytes at offset 0xF00
        page[4096 - 8..4096 - 4].copy_from_slice(&[0xFF, 0x0F, 0x00, 0x0F]);
        let bytes = EseFileBuilder::new(layout).raw_page(5, page).build();
        let ctx = FileContext::new(Box::new(bytes))?;

        assert!(matches!(collect(&ctx, 5), Err(EseError::Truncated { .. })));
        Ok(())
    }

    #[test]
    fn test_invalid_root_is_a_no_op() -> Result<()> {
        let layout = FormatLayout::new(0x620, 0x11, 4096);
        let bytes = EseFileBuilder::new(layout).page(4, PageBuilder::leaf()).build();
        let ctx = FileContext::new(Box::new(bytes))?;

        let (seen, visited) = collect(&ctx, 0)?;
        assert!(seen.is_empty());
        assert_eq!(visited, 0);
        Ok(())
    }
}
