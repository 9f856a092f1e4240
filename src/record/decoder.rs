//! Generic record decoding.
//!
//! A record is laid out as:
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ last fixed id: u8 │ last variable id: u8 │ var offset: u16 │
//! ├────────────────────────────────────────────────────────────┤
//! │ Fixed columns (ids 1..=127) in id order, then null bitmap  │
//! ├──────────────────────────── var offset ────────────────────┤
//! │ Variable directory: u16 end offset per column (ids 128..)  │
//! │ Variable column data                                       │
//! ├────────────────────────────────────────────────────────────┤
//! │ Tagged directory: (u16 id, u16 offset) per column (256..)  │
//! │ Tagged column data, each with an optional flag byte        │
//! └────────────────────────────────────────────────────────────┘
//! ```
//! Nothing about the columns is known ahead of time: widths, types and
//! code pages all come from the catalog.

use crate::catalog::{Column, Table};
use crate::error::{EseError, Result};
use crate::record::compression::{classify_and_decode, decode_codepage};
use crate::record::long_value::{Lid, LongValueIndex};
use crate::record::row::{Row, Value, Warning};
use crate::types::{format_guid, read_u16, read_u32, read_u64, read_u8, slice, ColumnType, FormatLayout};
use bitflags::bitflags;
use tracing::trace;

/// Offset of the first fixed column
const FIXED_DATA_OFFSET: usize = 4;

/// Null marker in a variable column's end offset
const VARIABLE_NULL: u16 = 0x8000;

/// Tagged directory offset mask on small-page layouts
const SMALL_TAGGED_OFFSET_MASK: u16 = 0x1FFF;

/// Marks a tagged value that carries a flag byte on small-page layouts
const SMALL_TAGGED_HAS_FLAGS: u16 = 0x4000;

/// Tagged directory offset mask on the large-page layout
const LARGE_TAGGED_OFFSET_MASK: u16 = 0x7FFF;

bitflags! {
    /// Flag byte in front of a tagged column value
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TaggedDataFlags: u8 {
        const VARIABLE_SIZE = 0x01;
        const COMPRESSED = 0x02;
        /// The value is a LID into the table's long-value tree
        const LONG_VALUE = 0x04;
        const MULTI_VALUE = 0x08;
        const TWO_VALUES = 0x10;
        const NULL = 0x20;
    }
}

/// One entry of a record's tagged directory
#[derive(Debug, Clone, Copy)]
struct TaggedSlot {
    id: u16,
    offset: usize,
    has_flags: bool,
}

/// Decodes the records of one table
pub struct RowDecoder<'a> {
    table: &'a Table,
    layout: FormatLayout,
    long_values: &'a LongValueIndex,
}

impl<'a> RowDecoder<'a> {
    /// Create a decoder for `table`'s records
    pub fn new(table: &'a Table, layout: FormatLayout, long_values: &'a LongValueIndex) -> Self {
        Self {
            table,
            layout,
            long_values,
        }
    }

    /// Decode one record into a row.
    ///
    /// Null and absent columns are left out of the row.
    pub fn decode(&self, record: &[u8]) -> Result<Row> {
        let last_fixed = read_u8(record, 0, "record header")? as u32;
        let last_variable = read_u8(record, 1, "record header")? as u32;
        let variable_offset = read_u16(record, 2, "record header")? as usize;

        let mut row = Row::new();
        self.decode_fixed(record, last_fixed, variable_offset, &mut row)?;
        let tagged_start = self.decode_variable(record, last_variable, variable_offset, &mut row)?;
        self.decode_tagged(record, tagged_start, &mut row)?;
        Ok(row)
    }

    fn decode_fixed(
        &self,
        record: &[u8],
        last_fixed: u32,
        variable_offset: usize,
        row: &mut Row,
    ) -> Result<()> {
        let bitmap_len = (last_fixed as usize + 7) / 8;
        let bitmap_start = variable_offset.checked_sub(bitmap_len).ok_or_else(|| {
            EseError::format(format!(
                "variable offset {} leaves no room for the null bitmap",
                variable_offset
            ))
        })?;
        let bitmap = slice(record, bitmap_start, bitmap_len, "null bitmap")?;

        let mut offset = FIXED_DATA_OFFSET;
        for column in self.table.fixed_columns() {
            if column.id > last_fixed {
                break;
            }
            let width = column.fixed_width().ok_or_else(|| {
                EseError::schema(format!("fixed column {} has no width", column.name))
            })?;
            let bytes = slice(record, offset, width, "fixed column")?;
            offset += width;

            let bit = (column.id - 1) as usize;
            if bitmap[bit / 8] & (1 << (bit % 8)) != 0 {
                continue;
            }
            row.insert(column.name.clone(), decode_value(column, bytes)?);
        }
        Ok(())
    }

    /// Decode variable columns, returning where the tagged area starts
    fn decode_variable(
        &self,
        record: &[u8],
        last_variable: u32,
        variable_offset: usize,
        row: &mut Row,
    ) -> Result<usize> {
        let count = last_variable.saturating_sub(127) as usize;
        let data_start = variable_offset + 2 * count;

        let mut previous_end = 0usize;
        for i in 0..count {
            let raw = read_u16(record, variable_offset + 2 * i, "variable directory")?;
            let end = (raw & !VARIABLE_NULL) as usize;
            let null = raw & VARIABLE_NULL != 0;

            if !null {
                let len = end.checked_sub(previous_end).ok_or_else(|| {
                    EseError::format(format!("variable column end {} before {}", end, previous_end))
                })?;
                let bytes = slice(record, data_start + previous_end, len, "variable column")?;
                if let Some(column) = self.table.column_by_id(128 + i as u32) {
                    row.insert(column.name.clone(), decode_value(column, bytes)?);
                }
            }
            previous_end = end;
        }
        Ok(data_start + previous_end)
    }

    fn tagged_directory(&self, record: &[u8], start: usize) -> Result<Vec<TaggedSlot>> {
        let mut slots = Vec::new();
        let mut pos = start;
        let mut directory_end = usize::MAX;

        while pos < record.len() && pos < directory_end {
            let id = read_u16(record, pos, "tagged directory")?;
            let raw = read_u16(record, pos + 2, "tagged directory")?;

            let (offset, has_flags) = if self.layout.has_large_tags() {
                ((raw & LARGE_TAGGED_OFFSET_MASK) as usize, true)
            } else {
                (
                    (raw & SMALL_TAGGED_OFFSET_MASK) as usize,
                    raw & SMALL_TAGGED_HAS_FLAGS != 0,
                )
            };

            directory_end = directory_end.min(start + offset);
            slots.push(TaggedSlot {
                id,
                offset,
                has_flags,
            });
            pos += 4;
        }
        Ok(slots)
    }

    fn decode_tagged(&self, record: &[u8], start: usize, row: &mut Row) -> Result<()> {
        if start >= record.len() {
            return Ok(());
        }

        let slots = self.tagged_directory(record, start)?;
        for (i, slot) in slots.iter().enumerate() {
            let value_start = start + slot.offset;
            let value_end = slots
                .get(i + 1)
                .map_or(record.len(), |next| start + next.offset);
            let len = value_end.checked_sub(value_start).ok_or_else(|| {
                EseError::format(format!("tagged column {} overlaps its successor", slot.id))
            })?;
            let bytes = slice(record, value_start, len, "tagged column")?;

            let Some(column) = self.table.column_by_id(slot.id as u32) else {
                trace!(id = slot.id, table = %self.table.name, "tagged column not in catalog");
                continue;
            };

            let (flags, bytes) = match (slot.has_flags, bytes.split_first()) {
                (true, Some((&flags, rest))) => (TaggedDataFlags::from_bits_retain(flags), rest),
                _ => (TaggedDataFlags::empty(), bytes),
            };

            self.decode_tagged_value(column, flags, bytes, row)?;
        }
        Ok(())
    }

    fn decode_tagged_value(
        &self,
        column: &Column,
        flags: TaggedDataFlags,
        bytes: &[u8],
        row: &mut Row,
    ) -> Result<()> {
        if flags.contains(TaggedDataFlags::NULL) {
            return Ok(());
        }

        if flags.intersects(TaggedDataFlags::MULTI_VALUE | TaggedDataFlags::TWO_VALUES) {
            row.insert(column.name.clone(), Value::Bytes(bytes.to_vec()));
            row.warn(Warning::MultiValue {
                column: column.name.clone(),
            });
            return Ok(());
        }

        let compressed = flags.contains(TaggedDataFlags::COMPRESSED);
        if flags.contains(TaggedDataFlags::LONG_VALUE) {
            let lid = Lid::from_reference(bytes)?;
            match self.long_values.get(lid) {
                Some(payload) => self.decode_content(column, compressed, payload, row)?,
                None => {
                    row.insert(column.name.clone(), Value::Bytes(bytes.to_vec()));
                    row.warn(Warning::MissingLongValue {
                        column: column.name.clone(),
                        lid: lid.0,
                    });
                }
            }
            return Ok(());
        }

        self.decode_content(column, compressed, bytes, row)
    }

    fn decode_content(&self, column: &Column, compressed: bool, bytes: &[u8], row: &mut Row) -> Result<()> {
        // Only text flagged compressed in its tagged entry is classified;
        // plain text columns go straight to their code page.
        if compressed && column.column_type.is_text() {
            match classify_and_decode(bytes) {
                (Some(text), _) => row.insert(column.name.clone(), Value::String(text)),
                (None, encoding) => {
                    trace!(column = %column.name, ?encoding, "compressed text kept raw");
                    row.insert(column.name.clone(), Value::Bytes(bytes.to_vec()));
                    row.warn(Warning::Lzxpress {
                        column: column.name.clone(),
                    });
                }
            }
            return Ok(());
        }

        row.insert(column.name.clone(), decode_value(column, bytes)?);
        Ok(())
    }
}

/// Decode an uncompressed column value by its catalog type
pub fn decode_value(column: &Column, bytes: &[u8]) -> Result<Value> {
    let what = "column value";
    Ok(match column.column_type {
        ColumnType::Bit => Value::Bool(read_u8(bytes, 0, what)? != 0),
        ColumnType::UnsignedByte => Value::Int(read_u8(bytes, 0, what)? as i64),
        ColumnType::Short => Value::Int(read_u16(bytes, 0, what)? as i16 as i64),
        ColumnType::UnsignedShort => Value::Int(read_u16(bytes, 0, what)? as i64),
        ColumnType::Long => Value::Int(read_u32(bytes, 0, what)? as i32 as i64),
        ColumnType::UnsignedLong => Value::Int(read_u32(bytes, 0, what)? as i64),
        ColumnType::LongLong | ColumnType::Currency | ColumnType::DateTime => {
            Value::Int(read_u64(bytes, 0, what)? as i64)
        }
        ColumnType::IeeeSingle => Value::Float(f32::from_bits(read_u32(bytes, 0, what)?) as f64),
        ColumnType::IeeeDouble => Value::Float(f64::from_bits(read_u64(bytes, 0, what)?)),
        ColumnType::Guid => {
            let raw: [u8; 16] = slice(bytes, 0, 16, what)?
                .try_into()
                .map_err(|_| EseError::truncated(what, 0, 16, bytes.len()))?;
            Value::String(format_guid(&raw))
        }
        ColumnType::Text | ColumnType::LongText => Value::String(decode_codepage(bytes, column.codepage)),
        ColumnType::Nil
        | ColumnType::Binary
        | ColumnType::LongBinary
        | ColumnType::Slv
        | ColumnType::Other(_) => Value::Bytes(bytes.to_vec()),
    })
}
