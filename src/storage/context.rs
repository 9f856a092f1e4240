//! Per-open file state and page addressing.

use crate::error::{EseError, Result};
use crate::page::{Page, PageHeader};
use crate::storage::file_header::{DatabaseState, FileHeader, FILE_HEADER_SIZE};
use crate::storage::source::{FileSource, ReadAt};
use crate::types::{FormatLayout, PageId, PAGE_HEADER_SIZE};
use std::path::Path;
use tracing::{debug, warn};

/// Immutable state for one open database file.
///
/// Holds the byte source and the values decoded from the file header.
/// Everything else in the reader borrows a `FileContext`; nothing mutates
/// it after construction, so it can be shared across threads.
pub struct FileContext {
    source: Box<dyn ReadAt>,
    file_size: u64,
    header: FileHeader,
    layout: FormatLayout,
}

impl FileContext {
    /// Read and validate the file header of `source`
    pub fn new(source: Box<dyn ReadAt>) -> Result<Self> {
        let file_size = source.size()?;

        let mut buf = vec![0u8; FILE_HEADER_SIZE];
        let n = source.read_at(&mut buf, 0)?;
        let header = FileHeader::read(&buf[..n])?;
        let layout = header.layout();

        if file_size < 2 * layout.page_size as u64 {
            return Err(EseError::format(format!(
                "file is {} bytes, shorter than the two {}-byte header pages",
                file_size, layout.page_size
            )));
        }

        if header.database_state == DatabaseState::DirtyShutdown {
            warn!("database was not shut down cleanly; reading it without log replay");
        }

        debug!(
            version = layout.version,
            revision = layout.revision,
            page_size = layout.page_size,
            large_tags = layout.has_large_tags(),
            "opened ESE file"
        );

        Ok(Self {
            source,
            file_size,
            header,
            layout,
        })
    }

    /// Open a file on disk
    pub fn open(path: &Path) -> Result<Self> {
        Self::new(Box::new(FileSource::open(path)?))
    }

    /// Decoded file header
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Layout values every page is read with
    pub fn layout(&self) -> FormatLayout {
        self.layout
    }

    /// Page size in bytes
    pub fn page_size(&self) -> usize {
        self.layout.page_size
    }

    /// Format version
    pub fn version(&self) -> u32 {
        self.layout.version
    }

    /// Format revision
    pub fn revision(&self) -> u32 {
        self.layout.revision
    }

    /// Size of the underlying source in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Number of logical pages after the two header pages
    pub fn page_count(&self) -> u64 {
        (self.file_size / self.layout.page_size as u64).saturating_sub(2)
    }

    /// Byte offset of a logical page
    pub fn page_offset(&self, id: PageId) -> u64 {
        id.file_offset(self.layout.page_size)
    }

    /// Read a whole page and decode its header
    pub fn read_page(&self, id: PageId) -> Result<Page> {
        let page_size = self.layout.page_size;
        let offset = self.page_offset(id);

        let mut buf = vec![0u8; page_size];
        let n = self.source.read_at(&mut buf, offset)?;
        if n < page_size {
            return Err(EseError::truncated("page", offset as usize, page_size, n));
        }

        Page::from_bytes(id, self.layout, buf)
    }

    /// Read only the fixed header of a page
    pub fn read_page_header(&self, id: PageId) -> Result<PageHeader> {
        let offset = self.page_offset(id);

        let mut buf = [0u8; PAGE_HEADER_SIZE];
        let n = self.source.read_at(&mut buf, offset)?;
        PageHeader::read(&buf[..n])
    }
}

impl std::fmt::Debug for FileContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileContext")
            .field("file_size", &self.file_size)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}
