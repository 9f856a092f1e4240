//! Error types for the ESE reader.

use crate::types::PageId;
use thiserror::Error;

/// Result type alias for reader operations
pub type Result<T> = std::result::Result<T, EseError>;

/// Errors that can occur while reading an ESE database
#[derive(Error, Debug)]
pub enum EseError {
    /// I/O error from the underlying byte source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a readable ESE database (bad signature, page size, ...)
    #[error("Invalid ESE file: {0}")]
    Format(String),

    /// The catalog has no table with this name
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// The catalog contents are inconsistent
    #[error("Schema error: {0}")]
    Schema(String),

    /// A read or slice ran past the end of the available data
    #[error("Truncated {what}: need {needed} bytes at offset {offset}, only {available} available")]
    Truncated {
        what: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Some rows of a table dump failed to decode
    #[error("{} rows failed to decode ({decoded} rows decoded)", .errors.len())]
    RowErrors {
        decoded: usize,
        errors: Vec<RowError>,
    },

    /// A callback asked the walk to stop
    #[error("Walk cancelled")]
    Cancelled,
}

impl EseError {
    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a truncation error for a read of `needed` bytes at `offset`
    pub fn truncated(what: &'static str, offset: usize, needed: usize, available: usize) -> Self {
        Self::Truncated {
            what,
            offset,
            needed,
            available,
        }
    }
}

/// A single row that could not be decoded during a table dump
#[derive(Error, Debug)]
#[error("page {page}, tag {tag}: {reason}")]
pub struct RowError {
    /// Page holding the broken entry
    pub page: PageId,
    /// Tag index of the entry within the page
    pub tag: usize,
    /// The decode failure
    pub reason: Box<EseError>,
}
