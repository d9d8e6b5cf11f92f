//! Conversion between record instances and storage rows.
//!
//! Native columns pass through with a runtime type check; binary
//! columns go through a versioned opaque envelope so composite values
//! round-trip byte-identically across process restarts.

use crate::error::CodecError;
use crate::schema::{ColumnDescriptor, ColumnType};
use crate::schema::record::Record;
use crate::value::{FieldValue, Row, StorageValue};
use indexmap::IndexMap;

/// Version byte prefixed to every opaque payload.
pub const OPAQUE_FORMAT_VERSION: u8 = 1;

/// Encode an opaque field value into its versioned binary form.
pub fn encode_opaque(value: &FieldValue) -> Result<Vec<u8>, CodecError> {
    let body =
        postcard::to_stdvec(value).map_err(|e| CodecError::OpaqueEncode(e.to_string()))?;
    let mut payload = Vec::with_capacity(body.len() + 1);
    payload.push(OPAQUE_FORMAT_VERSION);
    payload.extend_from_slice(&body);
    Ok(payload)
}

/// Decode an opaque payload produced by [`encode_opaque`].
pub fn decode_opaque(payload: &[u8]) -> Result<FieldValue, CodecError> {
    match payload.split_first() {
        Some((&OPAQUE_FORMAT_VERSION, body)) => {
            postcard::from_bytes(body).map_err(|e| CodecError::OpaqueDecode(e.to_string()))
        }
        Some((&version, _)) => Err(CodecError::UnsupportedOpaqueVersion { version }),
        None => Err(CodecError::OpaqueDecode("empty payload".to_string())),
    }
}

/// Convert a native (non-binary) field value into its storage form.
///
/// No silent coercion: the value's runtime type must match the column's
/// logical type exactly.
pub(crate) fn storage_value(
    field: &str,
    column_type: ColumnType,
    value: &FieldValue,
) -> Result<StorageValue, CodecError> {
    match (column_type, value) {
        (_, FieldValue::Null) => Ok(StorageValue::Null),
        (ColumnType::Integer, FieldValue::Int(i)) => Ok(StorageValue::Int(*i)),
        (ColumnType::Real, FieldValue::Real(f)) => Ok(StorageValue::Real(*f)),
        (ColumnType::Boolean, FieldValue::Bool(b)) => Ok(StorageValue::Bool(*b)),
        (ColumnType::Text, FieldValue::Text(s)) => Ok(StorageValue::Text(s.clone())),
        (ColumnType::Timestamp, FieldValue::Timestamp(t)) => Ok(StorageValue::Timestamp(*t)),
        (expected, found) => Err(CodecError::TypeMismatch {
            field: field.to_string(),
            expected,
            found: found.kind(),
        }),
    }
}

/// Convert a storage cell back into a field value for a native column.
///
/// Backends collapse booleans, timestamps, and integral reals into
/// plain integers; re-tag those here so decoded records carry the
/// column's logical type.
fn field_value(column: &ColumnDescriptor, cell: &StorageValue) -> Result<FieldValue, CodecError> {
    match (column.column_type, cell) {
        (_, StorageValue::Null) => Ok(FieldValue::Null),
        (ColumnType::Integer, StorageValue::Int(i)) => Ok(FieldValue::Int(*i)),
        (ColumnType::Real, StorageValue::Real(f)) => Ok(FieldValue::Real(*f)),
        (ColumnType::Real, StorageValue::Int(i)) => Ok(FieldValue::Real(*i as f64)),
        (ColumnType::Boolean, StorageValue::Bool(b)) => Ok(FieldValue::Bool(*b)),
        (ColumnType::Boolean, StorageValue::Int(i)) if *i == 0 || *i == 1 => {
            Ok(FieldValue::Bool(*i != 0))
        }
        (ColumnType::Timestamp, StorageValue::Timestamp(t)) => Ok(FieldValue::Timestamp(*t)),
        (ColumnType::Timestamp, StorageValue::Int(t)) => Ok(FieldValue::Timestamp(*t)),
        (ColumnType::Text, StorageValue::Text(s)) => Ok(FieldValue::Text(s.clone())),
        (expected, found) => Err(CodecError::TypeMismatch {
            field: column.name.clone(),
            expected,
            found: found.kind(),
        }),
    }
}

/// Encode a record into a row keyed by column name, in column order.
///
/// Fields absent on the record map to `Null`; fields the column list
/// does not mention are ignored.
pub fn encode(record: &Record, columns: &[ColumnDescriptor]) -> Result<Row, CodecError> {
    let mut row = IndexMap::with_capacity(columns.len());

    for column in columns {
        let cell = match record.get(&column.name) {
            None | Some(FieldValue::Null) => StorageValue::Null,
            Some(value) if column.column_type == ColumnType::Binary => {
                StorageValue::Bytes(encode_opaque(value)?)
            }
            Some(value) => storage_value(&column.name, column.column_type, value)?,
        };
        row.insert(column.name.clone(), cell);
    }

    Ok(row)
}

/// Decode a positional row into a record.
///
/// Cell positions correspond to the column list; a row shorter than the
/// column list is an error. Trailing cells beyond the column list are
/// ignored.
pub fn decode(columns: &[ColumnDescriptor], row: &[StorageValue]) -> Result<Record, CodecError> {
    if row.len() < columns.len() {
        return Err(CodecError::RowShapeMismatch {
            columns: columns.len(),
            cells: row.len(),
        });
    }

    let mut fields = IndexMap::with_capacity(columns.len());
    for (column, cell) in columns.iter().zip(row) {
        let value = if column.column_type == ColumnType::Binary {
            match cell {
                StorageValue::Null => FieldValue::Null,
                StorageValue::Bytes(payload) => decode_opaque(payload)?,
                other => {
                    return Err(CodecError::TypeMismatch {
                        field: column.name.clone(),
                        expected: ColumnType::Binary,
                        found: other.kind(),
                    })
                }
            }
        } else {
            field_value(column, cell)?
        };
        fields.insert(column.name.clone(), value);
    }

    Ok(Record { fields })
}
