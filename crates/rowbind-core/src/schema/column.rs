//! Canonical column model.

use crate::error::SchemaError;
use crate::value::StorageValue;
use serde::{Deserialize, Serialize};

/// Backend-independent logical column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// 64-bit signed integer.
    Integer,
    /// UTF-8 string.
    Text,
    /// 64-bit floating point.
    Real,
    /// Boolean value.
    Boolean,
    /// Timestamp as microseconds since Unix epoch.
    Timestamp,
    /// Opaque binary payload.
    Binary,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Text => "text",
            ColumnType::Real => "real",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Binary => "binary",
        };
        write!(f, "{}", name)
    }
}

/// Canonical, backend-agnostic description of one table column.
///
/// An immutable value object with structural equality. The default, when
/// present, is already in the storage representation the codec would
/// produce for this column (binary defaults are pre-encoded, not
/// deferred).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name; matches a record field name, unique within a table.
    pub name: String,
    /// Logical column type.
    pub column_type: ColumnType,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Default value in storage representation.
    pub default: Option<StorageValue>,
    /// Whether this column is the table's primary key.
    pub primary_key: bool,
    /// Whether this column carries a uniqueness constraint.
    pub unique: bool,
}

impl ColumnDescriptor {
    /// Create a non-nullable column with no flags.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            default: None,
            primary_key: false,
            unique: false,
        }
    }

    /// Mark the column nullable.
    pub fn with_nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Set the default value (storage representation).
    pub fn with_default(mut self, default: impl Into<StorageValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mark as primary key. Primary keys are never nullable.
    pub fn with_primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Mark as unique.
    pub fn with_unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Check the descriptor's invariants.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::InvalidColumnDescriptor {
                name: self.name.clone(),
                reason: "column name is empty".to_string(),
            });
        }
        if self.primary_key && self.nullable {
            return Err(SchemaError::InvalidColumnDescriptor {
                name: self.name.clone(),
                reason: "a primary key column cannot be nullable".to_string(),
            });
        }
        Ok(())
    }
}
