//! # ESE Reader
//!
//! A read-only decoder for Extensible Storage Engine (ESE) database files,
//! the paged B+tree format behind `WebCacheV01.dat`, `Windows.edb` and
//! other Windows artifacts.
//!
//! ## Architecture
//!
//! The reader is composed of layers, each borrowing the one below:
//!
//! - **Storage Layer** (`storage`): Byte sources, file header, page addressing
//! - **Page Layer** (`page`): Page headers, tag directories, leaf/branch entries
//! - **B-Tree Layer** (`btree`): Key reconstruction and cycle-safe tree walks
//! - **Record Layer** (`record`): Generic row decoding, text compression, long values
//! - **Catalog** (`catalog`): The schema stored in the file, and table dumps
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ese_reader::{Config, EseDb};
//!
//! let db = EseDb::open(Config::new("WebCacheV01.dat"))?;
//!
//! for name in db.table_names() {
//!     println!("{}", name);
//! }
//!
//! db.dump_table("Containers", |row| {
//!     println!("{}", serde_json::to_string(&row)?);
//!     Ok(())
//! })?;
//! ```

pub mod btree;
pub mod catalog;
pub mod error;
pub mod page;
pub mod record;
pub mod storage;
pub mod types;

#[cfg(test)]
mod fixture;

pub use error::{EseError, Result, RowError};
pub use types::{ColumnType, FormatLayout, PageId, TraceConfig};

// Re-export main public API
pub use btree::PageWalker;
pub use catalog::{Catalog, Column, DumpStats, Table};
pub use record::{LongValueIndex, Row, Value, Warning};
pub use storage::{FileContext, FileSource, ReadAt};

use serde::Serialize;
use std::path::PathBuf;

/// Reader configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the database file
    pub path: PathBuf,
    /// Verbose tracing switches (default: all off)
    pub trace: TraceConfig,
}

impl Config {
    /// Create a new configuration with default settings
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            trace: TraceConfig::default(),
        }
    }

    /// Set tracing switches
    pub fn trace(mut self, trace: TraceConfig) -> Self {
        self.trace = trace;
        self
    }
}

/// Summary of one table, for listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub name: String,
    pub root: PageId,
    pub columns: usize,
    pub indexes: usize,
    pub long_values: usize,
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStats {
    /// File format version
    pub format_version: u32,
    /// File format revision
    pub format_revision: u32,
    /// Page size in bytes
    pub page_size: usize,
    /// Number of logical pages in the file
    pub page_count: u64,
    /// Number of tables in the catalog
    pub table_count: usize,
}

/// Main database handle: an open file and its catalog.
///
/// The handle is immutable and `Sync`; several threads may dump tables
/// from the same handle at once.
pub struct EseDb {
    ctx: FileContext,
    catalog: Catalog,
    trace: TraceConfig,
}

impl EseDb {
    /// Open a database file and load its catalog
    pub fn open(config: Config) -> Result<Self> {
        let ctx = FileContext::open(&config.path)?;
        Self::with_context(ctx, config.trace)
    }

    /// Read a database from any byte source
    pub fn from_source<S: ReadAt + 'static>(source: S, trace: TraceConfig) -> Result<Self> {
        Self::with_context(FileContext::new(Box::new(source))?, trace)
    }

    fn with_context(ctx: FileContext, trace: TraceConfig) -> Result<Self> {
        let catalog = Catalog::build(&ctx, trace)?;
        Ok(Self {
            ctx,
            catalog,
            trace,
        })
    }

    /// The open file
    pub fn context(&self) -> &FileContext {
        &self.ctx
    }

    /// The database schema
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Table names in catalog order
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.catalog.table_names()
    }

    /// Decode every row of a table, see [`Catalog::dump_table`]
    pub fn dump_table<F>(&self, name: &str, on_row: F) -> Result<DumpStats>
    where
        F: FnMut(Row) -> Result<()>,
    {
        self.catalog.dump_table(&self.ctx, name, self.trace, on_row)
    }

    /// Per-table summaries in catalog order
    pub fn summaries(&self) -> Vec<TableSummary> {
        self.catalog
            .tables()
            .iter()
            .map(|t| TableSummary {
                name: t.name.clone(),
                root: t.root,
                columns: t.columns().count(),
                indexes: t.indexes().len(),
                long_values: t.long_values().len(),
            })
            .collect()
    }

    /// Get statistics about the database
    pub fn stats(&self) -> DbStats {
        DbStats {
            format_version: self.ctx.version(),
            format_revision: self.ctx.revision(),
            page_size: self.ctx.page_size(),
            page_count: self.ctx.page_count(),
            table_count: self.catalog.tables().len(),
        }
    }
}
