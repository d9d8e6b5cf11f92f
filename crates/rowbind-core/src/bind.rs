//! Binding a record type to a table shape and an engine.
//!
//! A binding is derived fresh from a record schema on every
//! [`TableBinding::bind`] call and holds no engine handle; every row
//! operation borrows one explicitly. There is no process-wide binding
//! state.

use crate::codec;
use crate::engine::StorageEngine;
use crate::error::BindError;
use crate::schema::record::{Record, RecordSchema};
use crate::schema::translate::translate;
use crate::schema::{ColumnDescriptor, ColumnType};
use crate::value::{FieldValue, StorageValue};
use std::collections::HashSet;
use tracing::debug;

/// Field names tried, in order, by [`default_primary_key`].
const PRIMARY_KEY_CANDIDATES: [&str; 3] = ["id", "primary_key", "uuid"];

/// Pick a primary key from a schema's declared fields by candidate
/// name.
///
/// An opt-in convenience for callers that want one; the translator
/// itself never synthesizes a primary key.
pub fn default_primary_key(schema: &RecordSchema) -> Option<&str> {
    PRIMARY_KEY_CANDIDATES
        .iter()
        .copied()
        .find(|candidate| schema.fields.contains_key(*candidate))
}

/// Whether `bind` created the table or found it already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// The table did not exist and was created from the column list.
    Created,
    /// The table already exists. Its shape is left untouched; evolving
    /// it is explicit-migration territory.
    Existing,
}

/// A record type bound to a table shape.
#[derive(Debug, Clone)]
pub struct TableBinding {
    table: String,
    primary_key: Option<String>,
    columns: Vec<ColumnDescriptor>,
    outcome: BindOutcome,
}

impl TableBinding {
    /// Translate a record schema and bind it to a table.
    ///
    /// Creates the table when absent; an existing table is not
    /// inspected or altered.
    pub fn bind<E: StorageEngine + ?Sized>(
        engine: &mut E,
        table: &str,
        schema: &RecordSchema,
        primary_key: Option<&str>,
        unique: &HashSet<String>,
    ) -> Result<Self, BindError> {
        let columns = translate(schema, primary_key, unique)?;

        let outcome = if engine.table_exists(table)? {
            BindOutcome::Existing
        } else {
            engine.create_table(table, &columns)?;
            BindOutcome::Created
        };

        debug!(table, ?outcome, columns = columns.len(), "bound record type");

        Ok(Self {
            table: table.to_string(),
            primary_key: primary_key.map(str::to_string),
            columns,
            outcome,
        })
    }

    /// The bound table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The canonical column list, in declaration order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// The configured primary key, if any.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Whether the bind created the table.
    pub fn outcome(&self) -> BindOutcome {
        self.outcome
    }

    fn column(&self, name: &str) -> Result<&ColumnDescriptor, BindError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| BindError::UnknownColumn {
                table: self.table.clone(),
                name: name.to_string(),
            })
    }

    /// Encode one filter value for its column.
    fn filter_cell(&self, name: &str, value: &FieldValue) -> Result<StorageValue, BindError> {
        let column = self.column(name)?;
        let cell = if column.column_type == ColumnType::Binary && !value.is_null() {
            StorageValue::Bytes(codec::encode_opaque(value)?)
        } else {
            codec::storage_value(name, column.column_type, value)?
        };
        Ok(cell)
    }

    fn primary_key_column(&self) -> Result<&ColumnDescriptor, BindError> {
        let name = self
            .primary_key
            .as_deref()
            .ok_or_else(|| BindError::NoPrimaryKey {
                table: self.table.clone(),
            })?;
        self.column(name)
    }

    /// The record's primary key cell, required to address a stored row.
    fn key_cell(&self, record: &Record) -> Result<(String, StorageValue), BindError> {
        let column = self.primary_key_column()?;
        match record.get(&column.name) {
            None | Some(FieldValue::Null) => Err(BindError::MissingKey {
                column: column.name.clone(),
            }),
            Some(value) => Ok((
                column.name.clone(),
                self.filter_cell(&column.name, value)?,
            )),
        }
    }

    /// Insert a record as a new row.
    ///
    /// When the primary key is an integer column left unset, the
    /// backend's generated row id is written back into the record.
    pub fn insert<E: StorageEngine + ?Sized>(
        &self,
        engine: &mut E,
        record: &mut Record,
    ) -> Result<(), BindError> {
        let row = codec::encode(record, &self.columns)?;
        let rowid = engine.insert(&self.table, &row)?;

        if let Some(pk) = self.primary_key.as_deref() {
            let column = self.column(pk)?;
            let unset = matches!(record.get(pk), None | Some(FieldValue::Null));
            if column.column_type == ColumnType::Integer && unset {
                record.set(pk, FieldValue::Int(rowid));
            }
        }

        Ok(())
    }

    /// Load the first record matching every filter conjunct.
    pub fn get<E: StorageEngine + ?Sized>(
        &self,
        engine: &mut E,
        filter: &[(&str, FieldValue)],
    ) -> Result<Option<Record>, BindError> {
        let storage_filter = filter
            .iter()
            .map(|(name, value)| Ok((name.to_string(), self.filter_cell(name, value)?)))
            .collect::<Result<Vec<_>, BindError>>()?;

        let rows = engine.select(&self.table, &storage_filter)?;
        match rows.first() {
            Some(cells) => Ok(Some(codec::decode(&self.columns, cells)?)),
            None => Ok(None),
        }
    }

    /// Load every record in the table.
    pub fn all<E: StorageEngine + ?Sized>(&self, engine: &mut E) -> Result<Vec<Record>, BindError> {
        let rows = engine.select(&self.table, &[])?;
        rows.iter()
            .map(|cells| codec::decode(&self.columns, cells).map_err(BindError::from))
            .collect()
    }

    /// Update the stored row addressed by the record's primary key.
    pub fn update<E: StorageEngine + ?Sized>(
        &self,
        engine: &mut E,
        record: &Record,
    ) -> Result<(), BindError> {
        let (key_column, _) = self.key_cell(record)?;
        let row = codec::encode(record, &self.columns)?;
        engine.update(&self.table, &row, &key_column)?;
        Ok(())
    }

    /// Delete the stored row addressed by the record's primary key.
    pub fn delete<E: StorageEngine + ?Sized>(
        &self,
        engine: &mut E,
        record: &Record,
    ) -> Result<(), BindError> {
        let (key_column, key) = self.key_cell(record)?;
        engine.delete(&self.table, &key_column, &key)?;
        Ok(())
    }
}
