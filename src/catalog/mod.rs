//! Catalog: the schema stored in the database itself.
//!
//! The catalog tree (rooted at page 4) lists every table followed by its
//! columns, indexes and long-value trees. Records belonging to one table
//! are contiguous and start with the table record, so the catalog is built
//! by folding the walk's leaf sequence into a list of tables.

mod entry;
mod table;

pub use entry::CatalogEntry;
pub use table::{Column, ColumnStorage, Index, LongValueSlot, Table, LAST_FIXED_COLUMN, LAST_VARIABLE_COLUMN};

use crate::btree::{LeafValue, PageWalker};
use crate::error::{EseError, Result, RowError};
use crate::record::{LongValueIndex, Row, RowDecoder};
use crate::storage::FileContext;
use crate::types::{PageId, TraceConfig};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Outcome of a successful table dump
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DumpStats {
    /// Rows delivered to the callback
    pub rows: usize,
    /// Warnings attached to those rows
    pub warnings: usize,
}

/// Accumulator threaded through the catalog walk
#[derive(Default)]
struct CatalogBuilder {
    tables: Vec<Table>,
    by_name: HashMap<String, usize>,
    current: Option<usize>,
}

impl CatalogBuilder {
    fn push(&mut self, entry: CatalogEntry) -> Result<()> {
        match entry {
            CatalogEntry::Table {
                name,
                object_id,
                root,
            } => {
                let table = Table::new(name.clone(), object_id, root);
                let index = match self.by_name.get(&name) {
                    Some(&index) => {
                        debug!(table = %name, "table listed twice; keeping the later definition");
                        self.tables[index] = table;
                        index
                    }
                    None => {
                        self.tables.push(table);
                        self.by_name.insert(name, self.tables.len() - 1);
                        self.tables.len() - 1
                    }
                };
                self.current = Some(index);
            }
            CatalogEntry::Column { column, .. } => {
                let name = column.name.clone();
                self.current_table("column", &name)?.add_column(column);
            }
            CatalogEntry::Index { index, .. } => {
                let name = index.name.clone();
                self.current_table("index", &name)?.add_index(index);
            }
            CatalogEntry::LongValue { slot, .. } => {
                let name = slot.name.clone();
                self.current_table("long value", &name)?.add_long_value(slot);
            }
            CatalogEntry::Callback { name } => {
                debug!(callback = %name, "skipping callback record");
            }
        }
        Ok(())
    }

    fn current_table(&mut self, kind: &str, name: &str) -> Result<&mut Table> {
        match self.current {
            Some(index) => Ok(&mut self.tables[index]),
            None => Err(EseError::schema(format!(
                "{} record {:?} appears before any table",
                kind, name
            ))),
        }
    }

    fn finish(self) -> Catalog {
        Catalog {
            tables: self.tables,
            by_name: self.by_name,
        }
    }
}

/// The database schema.
///
/// Immutable once built; may be shared between threads and reused for any
/// number of dumps.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: Vec<Table>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Walk the catalog tree and collect every table definition.
    ///
    /// Any undecodable catalog record fails the whole build.
    pub fn build(ctx: &FileContext, trace: TraceConfig) -> Result<Self> {
        let mut builder = CatalogBuilder::default();
        let mut walker = PageWalker::new(ctx, trace);

        walker.walk(PageId::CATALOG, |leaf| {
            if !leaf.page.header().holds_records() {
                return Ok(());
            }
            let key = leaf.key()?;
            let entry = CatalogEntry::decode(key.payload(leaf.value))?;
            if trace.catalog {
                debug!(page = %leaf.page.id(), tag = leaf.value.index, ?entry, "catalog record");
            }
            builder.push(entry)
        })?;

        let catalog = builder.finish();
        info!(
            tables = catalog.tables.len(),
            pages = walker.visited(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Tables in catalog order
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.by_name.get(name).map(|&index| &self.tables[index])
    }

    /// Table names in catalog order
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Decode every row of table `name`, in page order.
    ///
    /// Rows without any non-null column are skipped. Rows that fail to
    /// decode do not stop the dump: they are collected and returned as
    /// [`EseError::RowErrors`] once the walk is complete. An error from
    /// `on_row` stops the dump immediately and is returned as is.
    pub fn dump_table<F>(
        &self,
        ctx: &FileContext,
        name: &str,
        trace: TraceConfig,
        mut on_row: F,
    ) -> Result<DumpStats>
    where
        F: FnMut(Row) -> Result<()>,
    {
        let table = self
            .table(name)
            .ok_or_else(|| EseError::TableNotFound(name.to_string()))?;

        let long_values = LongValueIndex::build(ctx, table, trace)?;
        let decoder = RowDecoder::new(table, ctx.layout(), &long_values);

        let mut stats = DumpStats::default();
        let mut errors = Vec::new();
        let mut walker = PageWalker::new(ctx, trace);

        walker.walk(table.root, |leaf| {
            if !leaf.page.header().holds_records() {
                return Ok(());
            }
            match decode_leaf(&decoder, &leaf) {
                Ok(row) => {
                    stats.rows += 1;
                    stats.warnings += row.warnings().len();
                    on_row(row)
                }
                Err(e) => {
                    debug!(table = %table.name, page = %leaf.page.id(), tag = leaf.value.index, error = %e, "row failed to decode");
                    errors.push(RowError {
                        page: leaf.page.id(),
                        tag: leaf.value.index,
                        reason: Box::new(e),
                    });
                    Ok(())
                }
            }
        })?;

        debug!(
            table = %table.name,
            rows = stats.rows,
            failed = errors.len(),
            pages = walker.visited(),
            "table dumped"
        );

        if errors.is_empty() {
            Ok(stats)
        } else {
            Err(EseError::RowErrors {
                decoded: stats.rows,
                errors,
            })
        }
    }
}

fn decode_leaf(decoder: &RowDecoder<'_>, leaf: &LeafValue<'_>) -> Result<Row> {
    let key = leaf.key()?;
    decoder.decode(key.payload(leaf.value))
}
