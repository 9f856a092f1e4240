//! B-tree layer: key reconstruction and tree traversal.
//!
//! ESE stores every table, index and long-value column as a B+tree of
//! pages. This module provides:
//! - Key reconstruction from prefix-compressed entries
//! - Depth-first walks over a tree with leaf-chain following

mod key;
mod walker;

pub use key::{Key, MAX_KEY_SEGMENT};
pub use walker::{LeafValue, PageWalker, MAX_TREE_DEPTH};
