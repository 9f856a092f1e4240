//! Record layer: turning leaf entry payloads into rows.
//!
//! - `decoder`: catalog-driven decoding of fixed, variable and tagged columns
//! - `compression`: 7-bit packed and UTF-16 text, code pages
//! - `long_value`: LID references into a table's long-value tree
//! - `row`: the decoded row and its values

mod compression;
mod decoder;
mod long_value;
mod row;

pub use compression::{
    classify, classify_and_decode, decode_codepage, decode_utf16le, decompress_7bit, TextEncoding,
    CODEPAGE_UNICODE, LZXPRESS_MARKER,
};
pub use decoder::{decode_value, RowDecoder, TaggedDataFlags};
pub use long_value::{Lid, LongValueIndex, LID_SIZE};
pub use row::{to_hex, Row, Value, Warning};
