//! Storage layer: byte sources, the file header and page addressing.
//!
//! This module turns a random-access byte source into logical pages. The
//! file header is read once per open and fixes the layout every page is
//! decoded with.

mod context;
mod file_header;
mod source;

pub use context::FileContext;
pub use file_header::{DatabaseState, FileHeader, FILE_HEADER_SIZE};
pub use source::{FileSource, ReadAt};
