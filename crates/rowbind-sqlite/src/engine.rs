//! rusqlite-backed implementation of the storage engine trait.

use crate::ddl;
use rowbind_core::engine::StorageEngine;
use rowbind_core::error::EngineError;
use rowbind_core::migration::{ConstraintKind, MigrationStep};
use rowbind_core::schema::ColumnDescriptor;
use rowbind_core::value::{Row, StorageValue};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use tracing::trace;

/// Convert a storage value into a SQLite parameter.
///
/// Booleans and timestamps are stored as integers.
fn to_sql(value: &StorageValue) -> Value {
    match value {
        StorageValue::Null => Value::Null,
        StorageValue::Int(i) => Value::Integer(*i),
        StorageValue::Real(f) => Value::Real(*f),
        StorageValue::Bool(b) => Value::Integer(i64::from(*b)),
        StorageValue::Timestamp(t) => Value::Integer(*t),
        StorageValue::Text(s) => Value::Text(s.clone()),
        StorageValue::Bytes(b) => Value::Blob(b.clone()),
    }
}

/// Convert a SQLite cell into a storage value.
///
/// The codec re-tags integers into booleans and timestamps using the
/// column list; this conversion stays representation-level.
fn from_sql(value: ValueRef<'_>) -> Result<StorageValue, EngineError> {
    match value {
        ValueRef::Null => Ok(StorageValue::Null),
        ValueRef::Integer(i) => Ok(StorageValue::Int(i)),
        ValueRef::Real(f) => Ok(StorageValue::Real(f)),
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
            .map(StorageValue::Text)
            .map_err(EngineError::backend),
        ValueRef::Blob(bytes) => Ok(StorageValue::Bytes(bytes.to_vec())),
    }
}

/// A column as reported by `PRAGMA table_info`, plus its uniqueness.
///
/// The rebuild path reconstructs table definitions from this shape;
/// defaults stay as verbatim SQL expression text.
#[derive(Debug, Clone)]
struct RawColumn {
    name: String,
    decl_type: String,
    notnull: bool,
    pk: bool,
    dflt: Option<String>,
    unique: bool,
}

fn render_raw_column(column: &RawColumn) -> String {
    let mut sql = ddl::quote_ident(&column.name);
    if !column.decl_type.is_empty() {
        sql.push(' ');
        sql.push_str(&column.decl_type);
    }
    if column.pk {
        sql.push_str(" PRIMARY KEY");
    } else if column.notnull {
        sql.push_str(" NOT NULL");
    }
    if column.unique && !column.pk {
        sql.push_str(" UNIQUE");
    }
    if let Some(dflt) = &column.dflt {
        sql.push_str(" DEFAULT ");
        sql.push_str(dflt);
    }
    sql
}

fn find_column<'a>(
    shape: &'a mut [RawColumn],
    name: &str,
) -> Result<&'a mut RawColumn, EngineError> {
    shape
        .iter_mut()
        .find(|c| c.name == name)
        .ok_or_else(|| EngineError::Missing(format!("column '{}'", name)))
}

/// Storage engine over a SQLite connection.
pub struct SqliteEngine {
    conn: Connection,
}

impl SqliteEngine {
    /// Open or create a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Connection::open(path)
            .map(Self::from_connection)
            .map_err(EngineError::backend)
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self, EngineError> {
        Connection::open_in_memory()
            .map(Self::from_connection)
            .map_err(EngineError::backend)
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn execute_ddl(&self, sql: &str) -> Result<(), EngineError> {
        trace!(%sql, "ddl");
        self.conn.execute_batch(sql).map_err(EngineError::backend)
    }

    /// Read the live shape of a table.
    fn table_shape(&self, table: &str) -> Result<Vec<RawColumn>, EngineError> {
        let sql = format!("PRAGMA table_info({})", ddl::quote_ident(table));
        let mut stmt = self.conn.prepare(&sql).map_err(EngineError::backend)?;
        let mut rows = stmt.query([]).map_err(EngineError::backend)?;

        let mut shape = Vec::new();
        while let Some(row) = rows.next().map_err(EngineError::backend)? {
            let dflt = match row.get_ref(4).map_err(EngineError::backend)? {
                ValueRef::Null => None,
                // table_info reports the default as the expression text.
                other => match from_sql(other)? {
                    StorageValue::Text(s) => Some(s),
                    StorageValue::Int(i) => Some(i.to_string()),
                    StorageValue::Real(f) => Some(f.to_string()),
                    other => Some(ddl::literal(&other)),
                },
            };
            shape.push(RawColumn {
                name: row.get(1).map_err(EngineError::backend)?,
                decl_type: row.get(2).map_err(EngineError::backend)?,
                notnull: row.get::<_, i64>(3).map_err(EngineError::backend)? != 0,
                pk: row.get::<_, i64>(5).map_err(EngineError::backend)? != 0,
                dflt,
                unique: false,
            });
        }
        drop(rows);
        drop(stmt);

        if shape.is_empty() {
            return Err(EngineError::Missing(format!("table '{}'", table)));
        }

        // Fold unique indexes (inline UNIQUE shows up here too) back
        // into per-column flags.
        let sql = format!("PRAGMA index_list({})", ddl::quote_ident(table));
        let mut stmt = self.conn.prepare(&sql).map_err(EngineError::backend)?;
        let mut rows = stmt.query([]).map_err(EngineError::backend)?;
        let mut unique_indexes: Vec<String> = Vec::new();
        while let Some(row) = rows.next().map_err(EngineError::backend)? {
            let name: String = row.get(1).map_err(EngineError::backend)?;
            let unique: i64 = row.get(2).map_err(EngineError::backend)?;
            let origin: String = row.get(3).map_err(EngineError::backend)?;
            if unique != 0 && origin != "pk" {
                unique_indexes.push(name);
            }
        }
        drop(rows);
        drop(stmt);

        for index in unique_indexes {
            let sql = format!("PRAGMA index_info({})", ddl::quote_ident(&index));
            let mut stmt = self.conn.prepare(&sql).map_err(EngineError::backend)?;
            let mut rows = stmt.query([]).map_err(EngineError::backend)?;
            let mut members: Vec<String> = Vec::new();
            while let Some(row) = rows.next().map_err(EngineError::backend)? {
                members.push(row.get(2).map_err(EngineError::backend)?);
            }
            match members.as_slice() {
                [column] => find_column(&mut shape, column)?.unique = true,
                _ => {
                    return Err(EngineError::Unsupported(format!(
                        "composite unique index '{}'",
                        index
                    )))
                }
            }
        }

        Ok(shape)
    }

    /// Reshape a table by rebuilding it: create the new shape, copy
    /// rows, drop the old table, rename. Runs under a savepoint so it
    /// nests inside a migration's transaction.
    fn rebuild(
        &mut self,
        table: &str,
        transform: impl FnOnce(&mut Vec<RawColumn>) -> Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        let mut shape = self.table_shape(table)?;
        transform(&mut shape)?;

        let tmp = format!("{}__rebuild", table);
        let defs: Vec<String> = shape.iter().map(render_raw_column).collect();
        let names: Vec<String> = shape.iter().map(|c| ddl::quote_ident(&c.name)).collect();
        let names = names.join(", ");

        self.execute_ddl("SAVEPOINT rowbind_rebuild")?;
        let result: Result<(), EngineError> = (|| {
            self.execute_ddl(&format!(
                "CREATE TABLE {} ({})",
                ddl::quote_ident(&tmp),
                defs.join(", ")
            ))?;
            self.execute_ddl(&format!(
                "INSERT INTO {} ({names}) SELECT {names} FROM {}",
                ddl::quote_ident(&tmp),
                ddl::quote_ident(table)
            ))?;
            self.execute_ddl(&format!("DROP TABLE {}", ddl::quote_ident(table)))?;
            self.execute_ddl(&format!(
                "ALTER TABLE {} RENAME TO {}",
                ddl::quote_ident(&tmp),
                ddl::quote_ident(table)
            ))?;
            Ok(())
        })();

        match result {
            Ok(()) => self.execute_ddl("RELEASE rowbind_rebuild"),
            Err(e) => {
                // Unwind to the savepoint; the original failure is what
                // the caller needs to see.
                let _ = self
                    .execute_ddl("ROLLBACK TO rowbind_rebuild; RELEASE rowbind_rebuild");
                Err(e)
            }
        }
    }
}

impl StorageEngine for SqliteEngine {
    fn table_exists(&mut self, table: &str) -> Result<bool, EngineError> {
        self.conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
            .map_err(EngineError::backend)
    }

    fn create_table(
        &mut self,
        table: &str,
        columns: &[ColumnDescriptor],
    ) -> Result<(), EngineError> {
        self.execute_ddl(&ddl::create_table_sql(table, columns))
    }

    fn apply_step(&mut self, table: &str, step: &MigrationStep) -> Result<(), EngineError> {
        match step {
            MigrationStep::RenameColumn { from, to } => self.execute_ddl(&format!(
                "ALTER TABLE {} RENAME COLUMN {} TO {}",
                ddl::quote_ident(table),
                ddl::quote_ident(from),
                ddl::quote_ident(to)
            )),
            MigrationStep::AddColumn { descriptor } => {
                if descriptor.primary_key {
                    return Err(EngineError::Unsupported(
                        "adding a primary key column to an existing table".to_string(),
                    ));
                }
                self.execute_ddl(&format!(
                    "ALTER TABLE {} ADD COLUMN {}",
                    ddl::quote_ident(table),
                    ddl::render_added_column(descriptor)
                ))?;
                if descriptor.unique {
                    self.execute_ddl(&format!(
                        "CREATE UNIQUE INDEX {} ON {} ({})",
                        ddl::quote_ident(&ddl::unique_index_name(table, &descriptor.name)),
                        ddl::quote_ident(table),
                        ddl::quote_ident(&descriptor.name)
                    ))?;
                }
                Ok(())
            }
            MigrationStep::RemoveColumn { name } => self.execute_ddl(&format!(
                "ALTER TABLE {} DROP COLUMN {}",
                ddl::quote_ident(table),
                ddl::quote_ident(name)
            )),
            MigrationStep::AddConstraint {
                column,
                constraint,
                fill,
            } => match constraint {
                ConstraintKind::Unique => self.execute_ddl(&format!(
                    "CREATE UNIQUE INDEX {} ON {} ({})",
                    ddl::quote_ident(&ddl::unique_index_name(table, column)),
                    ddl::quote_ident(table),
                    ddl::quote_ident(column)
                )),
                ConstraintKind::NotNull => {
                    if let Some(fill) = fill {
                        let sql = format!(
                            "UPDATE {} SET {} = ?1 WHERE {} IS NULL",
                            ddl::quote_ident(table),
                            ddl::quote_ident(column),
                            ddl::quote_ident(column)
                        );
                        trace!(%sql, "fill");
                        self.conn
                            .execute(&sql, [to_sql(fill)])
                            .map_err(EngineError::backend)?;
                    }
                    self.rebuild(table, |shape| {
                        find_column(shape, column)?.notnull = true;
                        Ok(())
                    })
                }
                ConstraintKind::PrimaryKey => self.rebuild(table, |shape| {
                    let target = find_column(shape, column)?;
                    target.pk = true;
                    target.notnull = true;
                    Ok(())
                }),
            },
            MigrationStep::RemoveConstraint { column, constraint } => match constraint {
                ConstraintKind::Unique => self.rebuild(table, |shape| {
                    find_column(shape, column)?.unique = false;
                    Ok(())
                }),
                ConstraintKind::NotNull => self.rebuild(table, |shape| {
                    find_column(shape, column)?.notnull = false;
                    Ok(())
                }),
                ConstraintKind::PrimaryKey => self.rebuild(table, |shape| {
                    let target = find_column(shape, column)?;
                    target.pk = false;
                    target.notnull = false;
                    Ok(())
                }),
            },
        }
    }

    fn begin(&mut self) -> Result<(), EngineError> {
        self.execute_ddl("BEGIN")
    }

    fn commit(&mut self) -> Result<(), EngineError> {
        self.execute_ddl("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), EngineError> {
        self.execute_ddl("ROLLBACK")
    }

    fn insert(&mut self, table: &str, row: &Row) -> Result<i64, EngineError> {
        // Null cells are omitted so column defaults apply.
        let present: Vec<(&String, &StorageValue)> =
            row.iter().filter(|(_, v)| !v.is_null()).collect();

        let sql = if present.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", ddl::quote_ident(table))
        } else {
            let columns: Vec<String> = present
                .iter()
                .map(|(name, _)| ddl::quote_ident(name))
                .collect();
            let placeholders = vec!["?"; present.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                ddl::quote_ident(table),
                columns.join(", "),
                placeholders
            )
        };

        trace!(%sql, "insert");
        self.conn
            .execute(
                &sql,
                params_from_iter(present.iter().map(|(_, value)| to_sql(value))),
            )
            .map_err(EngineError::backend)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn select(
        &mut self,
        table: &str,
        filter: &[(String, StorageValue)],
    ) -> Result<Vec<Vec<StorageValue>>, EngineError> {
        let mut sql = format!("SELECT * FROM {}", ddl::quote_ident(table));
        if !filter.is_empty() {
            let clauses: Vec<String> = filter
                .iter()
                .map(|(name, _)| format!("{} = ?", ddl::quote_ident(name)))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        trace!(%sql, "select");
        let mut stmt = self.conn.prepare(&sql).map_err(EngineError::backend)?;
        let column_count = stmt.column_count();
        let mut rows = stmt
            .query(params_from_iter(filter.iter().map(|(_, v)| to_sql(v))))
            .map_err(EngineError::backend)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(EngineError::backend)? {
            let mut cells = Vec::with_capacity(column_count);
            for index in 0..column_count {
                cells.push(from_sql(row.get_ref(index).map_err(EngineError::backend)?)?);
            }
            out.push(cells);
        }
        Ok(out)
    }

    fn update(&mut self, table: &str, row: &Row, key_column: &str) -> Result<(), EngineError> {
        let key = match row.get(key_column) {
            Some(value) if !value.is_null() => value,
            _ => {
                return Err(EngineError::Missing(format!(
                    "key column '{}' in update row",
                    key_column
                )))
            }
        };

        let sets: Vec<(&String, &StorageValue)> = row
            .iter()
            .filter(|(name, _)| name.as_str() != key_column)
            .collect();
        if sets.is_empty() {
            return Ok(());
        }

        let clauses: Vec<String> = sets
            .iter()
            .map(|(name, _)| format!("{} = ?", ddl::quote_ident(name)))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            ddl::quote_ident(table),
            clauses.join(", "),
            ddl::quote_ident(key_column)
        );

        trace!(%sql, "update");
        let params = sets
            .iter()
            .map(|(_, value)| to_sql(value))
            .chain(std::iter::once(to_sql(key)));
        self.conn
            .execute(&sql, params_from_iter(params))
            .map_err(EngineError::backend)?;
        Ok(())
    }

    fn delete(
        &mut self,
        table: &str,
        key_column: &str,
        key: &StorageValue,
    ) -> Result<(), EngineError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            ddl::quote_ident(table),
            ddl::quote_ident(key_column)
        );
        trace!(%sql, "delete");
        self.conn
            .execute(&sql, [to_sql(key)])
            .map_err(EngineError::backend)?;
        Ok(())
    }
}
