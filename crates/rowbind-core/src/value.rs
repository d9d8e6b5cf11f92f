//! Value types for record fields and table rows.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single cell value in its storage representation.
///
/// This is the only alphabet columns, defaults, and row tuples are
/// expressed in once a record schema has passed through the translator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StorageValue {
    /// SQL NULL.
    Null,
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Real(f64),
    /// Boolean value.
    Bool(bool),
    /// UTF-8 string.
    Text(String),
    /// Timestamp as microseconds since Unix epoch.
    Timestamp(i64),
    /// Binary data (opaque payloads and blob defaults).
    Bytes(Vec<u8>),
}

/// An encoded row: column name to storage value, in column order.
pub type Row = IndexMap<String, StorageValue>;

impl StorageValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, StorageValue::Null)
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StorageValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StorageValue::Real(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StorageValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StorageValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as timestamp.
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            StorageValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Try to get as bytes reference.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            StorageValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Variant name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageValue::Null => "null",
            StorageValue::Int(_) => "int",
            StorageValue::Real(_) => "real",
            StorageValue::Bool(_) => "bool",
            StorageValue::Text(_) => "text",
            StorageValue::Timestamp(_) => "timestamp",
            StorageValue::Bytes(_) => "bytes",
        }
    }
}

impl From<i64> for StorageValue {
    fn from(v: i64) -> Self {
        StorageValue::Int(v)
    }
}

impl From<f64> for StorageValue {
    fn from(v: f64) -> Self {
        StorageValue::Real(v)
    }
}

impl From<bool> for StorageValue {
    fn from(v: bool) -> Self {
        StorageValue::Bool(v)
    }
}

impl From<String> for StorageValue {
    fn from(v: String) -> Self {
        StorageValue::Text(v)
    }
}

impl From<&str> for StorageValue {
    fn from(v: &str) -> Self {
        StorageValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for StorageValue {
    fn from(v: Vec<u8>) -> Self {
        StorageValue::Bytes(v)
    }
}

impl<T: Into<StorageValue>> From<Option<T>> for StorageValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => StorageValue::Null,
        }
    }
}

/// A value held by a record field before encoding.
///
/// Scalar variants mirror [`StorageValue`]; `List` and `Map` cover the
/// composite shapes that translate to opaque binary columns and go
/// through the codec's binary encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Unset / null.
    Null,
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Real(f64),
    /// Boolean value.
    Bool(bool),
    /// UTF-8 string.
    Text(String),
    /// Timestamp as microseconds since Unix epoch.
    Timestamp(i64),
    /// Raw byte sequence.
    Bytes(Vec<u8>),
    /// Ordered sequence of values.
    List(Vec<FieldValue>),
    /// Ordered string-keyed mapping (nested records, dictionaries).
    Map(Vec<(String, FieldValue)>),
}

impl FieldValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Check if this value is a composite (list or map).
    pub fn is_composite(&self) -> bool {
        matches!(self, FieldValue::List(_) | FieldValue::Map(_))
    }

    /// Variant name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Int(_) => "int",
            FieldValue::Real(_) => "real",
            FieldValue::Bool(_) => "bool",
            FieldValue::Text(_) => "text",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::List(_) => "list",
            FieldValue::Map(_) => "map",
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(v: Vec<FieldValue>) -> Self {
        FieldValue::List(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => FieldValue::Null,
        }
    }
}
