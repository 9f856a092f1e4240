//! Decoded rows.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// A decoded column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Get the value as a string slice if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if it is one
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the raw bytes if the value is binary
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::Bytes(v) => write!(f, "{}", to_hex(v)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::Bytes(v) => serializer.serialize_str(&to_hex(v)),
        }
    }
}

/// Lowercase hex rendering of a byte string
pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}

/// Something in a row that was returned undecoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// LZXPRESS-compressed text, returned raw
    Lzxpress { column: String },
    /// A long-value reference whose first segment was not found
    #[serde(rename_all = "camelCase")]
    MissingLongValue { column: String, lid: u32 },
    /// Multi-valued tagged data, returned as raw bytes
    MultiValue { column: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lzxpress { column } => write!(f, "{}: LZXPRESS data left compressed", column),
            Self::MissingLongValue { column, lid } => {
                write!(f, "{}: long value {:#010x} not found", column, lid)
            }
            Self::MultiValue { column } => write!(f, "{}: multi-valued data left raw", column),
        }
    }
}

/// One decoded row: column values in decode order plus any warnings.
///
/// Serializes as a map from column name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
    warnings: Vec<Warning>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push((name.into(), value));
    }

    /// Record a warning
    pub fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Look up a column by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterate over `(name, value)` pairs in decode order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Column names in decode order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Number of columns with a value
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if no column had a value
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Warnings raised while decoding this row
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
