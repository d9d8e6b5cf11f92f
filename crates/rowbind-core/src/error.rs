//! Error types shared across the crate.
//!
//! One enum per concern area: schema errors are fatal to a bind attempt,
//! codec errors are fatal to a single encode/decode call, engine errors
//! surface backend failures through the [`crate::engine::StorageEngine`]
//! boundary. Migration errors live in [`crate::migration::error`].

use crate::schema::ColumnType;
use thiserror::Error;

/// Errors raised while translating a record type into a column list.
///
/// These indicate a programming error in the record type definition and
/// are never retried.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A union descriptor was not a two-member optional.
    #[error("ambiguous union type for field '{field}': {reason}")]
    AmbiguousUnionType {
        /// The field whose descriptor is ambiguous.
        field: String,
        /// What rule the union violates.
        reason: String,
    },

    /// The requested primary key is not a declared field.
    #[error("unknown primary key '{name}'")]
    UnknownPrimaryKey {
        /// The primary key name that was not found.
        name: String,
    },

    /// A column descriptor violates its own invariants.
    #[error("invalid column descriptor '{name}': {reason}")]
    InvalidColumnDescriptor {
        /// The column name.
        name: String,
        /// Which invariant is violated.
        reason: String,
    },
}

/// Errors raised by a single encode or decode call.
///
/// Safe to retry after correcting the input; shared state is untouched.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A field's runtime value does not match the column's logical type.
    #[error("type mismatch for field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        /// The field being converted.
        field: String,
        /// The column's logical type.
        expected: ColumnType,
        /// Variant name of the offending value.
        found: &'static str,
    },

    /// A row tuple has fewer cells than the column list.
    #[error("row shape mismatch: {columns} columns, {cells} cells")]
    RowShapeMismatch {
        /// Number of columns expected.
        columns: usize,
        /// Number of cells in the row.
        cells: usize,
    },

    /// Binary encoding of an opaque value failed.
    #[error("opaque encoding failed: {0}")]
    OpaqueEncode(String),

    /// Binary decoding of an opaque payload failed.
    #[error("opaque decoding failed: {0}")]
    OpaqueDecode(String),

    /// An opaque payload carries a format version this build cannot read.
    #[error("unsupported opaque format version {version}")]
    UnsupportedOpaqueVersion {
        /// The version byte found in the payload.
        version: u8,
    },
}

/// Errors surfaced by a storage engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The backend rejected a statement.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The backend cannot express the requested alteration.
    #[error("unsupported alteration: {0}")]
    Unsupported(String),

    /// A table or column referenced by an operation does not exist.
    #[error("no such object: {0}")]
    Missing(String),
}

impl EngineError {
    /// Wrap a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        EngineError::Backend(Box::new(err))
    }
}

/// Errors from the binding layer.
#[derive(Debug, Error)]
pub enum BindError {
    /// Schema translation failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Record encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The storage engine failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A filter or lookup referenced a column the binding does not have.
    #[error("unknown column '{name}' in table '{table}'")]
    UnknownColumn {
        /// The table bound.
        table: String,
        /// The unknown column name.
        name: String,
    },

    /// A row operation needs a primary key but none is configured.
    #[error("no primary key configured for table '{table}'")]
    NoPrimaryKey {
        /// The table bound.
        table: String,
    },

    /// A row operation needs the record's key value but it is unset.
    #[error("record has no value for key column '{column}'")]
    MissingKey {
        /// The primary key column.
        column: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::UnknownPrimaryKey {
            name: "pk".to_string(),
        };
        assert_eq!(err.to_string(), "unknown primary key 'pk'");

        let err = CodecError::RowShapeMismatch {
            columns: 3,
            cells: 2,
        };
        assert!(err.to_string().contains("3 columns"));

        let err = EngineError::Unsupported("composite unique index".to_string());
        assert!(err.to_string().starts_with("unsupported alteration"));
    }
}
