//! Catalog record decoding.
//!
//! Every catalog record shares one fixed layout:
//! ```text
//! Offset  Size  Description
//! 4       4     FatherDataPageID (object id of the owning table)
//! 8       2     Record type
//! 10      4     Identifier (column id for columns)
//! 14      4     Column type, or FatherDataPageNumber for trees
//! 18      4     Space usage
//! 22      4     Flags
//! 26      4     Code page (columns) or locale (indexes)
//! ```
//! followed by the variable-size item name.

use crate::catalog::{Column, Index, LongValueSlot};
use crate::error::{EseError, Result};
use crate::record::decode_codepage;
use crate::types::{read_u16, read_u32, read_u8, slice, ColumnType, PageId};

/// Catalog record type codes
const TYPE_TABLE: u16 = 1;
const TYPE_COLUMN: u16 = 2;
const TYPE_INDEX: u16 = 3;
const TYPE_LONG_VALUE: u16 = 4;
const TYPE_CALLBACK: u16 = 5;

/// One decoded catalog record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEntry {
    Table {
        name: String,
        object_id: u32,
        root: PageId,
    },
    Column {
        table_id: u32,
        column: Column,
    },
    Index {
        table_id: u32,
        index: Index,
    },
    LongValue {
        table_id: u32,
        slot: LongValueSlot,
    },
    Callback {
        name: String,
    },
}

impl CatalogEntry {
    /// Decode a catalog record (the leaf entry payload after the key)
    pub fn decode(record: &[u8]) -> Result<Self> {
        let what = "catalog record";
        let father_id = read_u32(record, 4, what)?;
        let kind = read_u16(record, 8, what)?;
        let identifier = read_u32(record, 10, what)?;
        let type_or_root = read_u32(record, 14, what)?;
        let space_usage = read_u32(record, 18, what)?;
        let flags = read_u32(record, 22, what)?;
        let codepage_or_locale = read_u32(record, 26, what)?;
        let name = item_name(record)?;

        Ok(match kind {
            TYPE_TABLE => Self::Table {
                name,
                object_id: father_id,
                root: PageId::new(type_or_root),
            },
            TYPE_COLUMN => Self::Column {
                table_id: father_id,
                column: Column {
                    id: identifier,
                    name,
                    column_type: ColumnType::from_code(type_or_root),
                    space_usage,
                    flags,
                    codepage: codepage_or_locale,
                },
            },
            TYPE_INDEX => Self::Index {
                table_id: father_id,
                index: Index {
                    name,
                    root: PageId::new(type_or_root),
                    locale: codepage_or_locale,
                },
            },
            TYPE_LONG_VALUE => Self::LongValue {
                table_id: father_id,
                slot: LongValueSlot {
                    name,
                    root: PageId::new(type_or_root),
                },
            },
            TYPE_CALLBACK => Self::Callback { name },
            other => {
                return Err(EseError::schema(format!(
                    "unknown catalog record type {} for {:?}",
                    other, name
                )))
            }
        })
    }
}

/// Read the item name: the first variable column of the record
fn item_name(record: &[u8]) -> Result<String> {
    let last_variable = read_u8(record, 1, "catalog record")? as usize;
    let variable_offset = read_u16(record, 2, "catalog record")? as usize;

    let count = if last_variable > 127 {
        last_variable - 127
    } else {
        last_variable
    };
    let len = (read_u16(record, variable_offset, "catalog item name")? & 0x7FFF) as usize;
    let bytes = slice(record, variable_offset + 2 * count, len, "catalog item name")?;
    Ok(decode_codepage(bytes, 1252))
}
