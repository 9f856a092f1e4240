//! Table definitions discovered in the catalog.

use crate::types::{ColumnType, PageId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Highest id of a fixed-size column
pub const LAST_FIXED_COLUMN: u32 = 127;

/// Highest id of a variable-size column
pub const LAST_VARIABLE_COLUMN: u32 = 255;

/// Where a column is stored inside a record, derived from its id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnStorage {
    Fixed,
    Variable,
    Tagged,
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: u32,
    pub name: String,
    pub column_type: ColumnType,
    /// Declared width; the stored width for fixed columns
    pub space_usage: u32,
    pub flags: u32,
    pub codepage: u32,
}

impl Column {
    /// Storage class of this column
    pub fn storage(&self) -> ColumnStorage {
        match self.id {
            0..=LAST_FIXED_COLUMN => ColumnStorage::Fixed,
            128..=LAST_VARIABLE_COLUMN => ColumnStorage::Variable,
            _ => ColumnStorage::Tagged,
        }
    }

    /// Bytes a fixed column occupies in a record
    pub fn fixed_width(&self) -> Option<usize> {
        if self.space_usage > 0 {
            Some(self.space_usage as usize)
        } else {
            self.column_type.fixed_size()
        }
    }
}

/// An index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub name: String,
    /// Root page of the index tree
    pub root: PageId,
    pub locale: u32,
}

/// A long-value tree holding a table's oversized column values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LongValueSlot {
    pub name: String,
    pub root: PageId,
}

/// A table and everything the catalog lists under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    /// Object id; column and index records point back to it
    pub object_id: u32,
    /// Root page of the table's data tree (FatherDataPageNumber)
    pub root: PageId,
    #[serde(serialize_with = "columns_in_id_order")]
    columns: BTreeMap<u32, Column>,
    indexes: Vec<Index>,
    long_values: Vec<LongValueSlot>,
}

impl Table {
    /// Create a table with no columns yet
    pub fn new(name: impl Into<String>, object_id: u32, root: PageId) -> Self {
        Self {
            name: name.into(),
            object_id,
            root,
            columns: BTreeMap::new(),
            indexes: Vec::new(),
            long_values: Vec::new(),
        }
    }

    /// Add a column, replacing any previous column with the same id
    pub fn add_column(&mut self, column: Column) {
        self.columns.insert(column.id, column);
    }

    pub fn add_index(&mut self, index: Index) {
        self.indexes.push(index);
    }

    pub fn add_long_value(&mut self, slot: LongValueSlot) {
        self.long_values.push(slot);
    }

    /// Columns in id order
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.values().find(|c| c.name == name)
    }

    /// Look up a column by id
    pub fn column_by_id(&self, id: u32) -> Option<&Column> {
        self.columns.get(&id)
    }

    /// Fixed columns in id order
    pub fn fixed_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.range(1..=LAST_FIXED_COLUMN).map(|(_, c)| c)
    }

    /// Indexes in catalog order
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Long-value trees in catalog order
    pub fn long_values(&self) -> &[LongValueSlot] {
        &self.long_values
    }

    /// Root page of the table's first long-value tree
    pub fn long_value_root(&self) -> Option<PageId> {
        self.long_values.first().map(|slot| slot.root)
    }
}

fn columns_in_id_order<S: serde::Serializer>(
    columns: &BTreeMap<u32, Column>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(columns.values())
}
