//! SQL rendering for the SQLite backend.

use rowbind_core::{ColumnDescriptor, ColumnType, StorageValue};
use std::fmt::Write;

/// Map a logical column type to its SQLite column type.
pub(crate) fn column_type_sql(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Integer => "INTEGER",
        ColumnType::Text => "TEXT",
        ColumnType::Real => "REAL",
        ColumnType::Boolean => "BOOLEAN",
        ColumnType::Timestamp => "TIMESTAMP",
        ColumnType::Binary => "BLOB",
    }
}

/// Double-quote an identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render a storage value as a SQL literal (used for DEFAULT clauses).
pub(crate) fn literal(value: &StorageValue) -> String {
    match value {
        StorageValue::Null => "NULL".to_string(),
        StorageValue::Int(i) => i.to_string(),
        StorageValue::Real(f) => f.to_string(),
        StorageValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        StorageValue::Timestamp(t) => t.to_string(),
        StorageValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        StorageValue::Bytes(bytes) => {
            let mut out = String::with_capacity(bytes.len() * 2 + 3);
            out.push_str("X'");
            for byte in bytes {
                // Writing to a String cannot fail.
                let _ = write!(out, "{:02X}", byte);
            }
            out.push('\'');
            out
        }
    }
}

/// Render a full column definition for CREATE TABLE.
pub(crate) fn render_column(column: &ColumnDescriptor) -> String {
    let mut sql = format!(
        "{} {}",
        quote_ident(&column.name),
        column_type_sql(column.column_type)
    );

    if column.primary_key {
        sql.push_str(" PRIMARY KEY");
        if column.column_type == ColumnType::Integer {
            sql.push_str(" AUTOINCREMENT");
        }
    } else if !column.nullable {
        sql.push_str(" NOT NULL");
    }

    if column.unique && !column.primary_key {
        sql.push_str(" UNIQUE");
    }

    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&literal(default));
    }

    sql
}

/// Render a column definition for ALTER TABLE ADD COLUMN.
///
/// SQLite rejects UNIQUE in an added column definition; the engine
/// creates a unique index separately.
pub(crate) fn render_added_column(column: &ColumnDescriptor) -> String {
    let mut sql = format!(
        "{} {}",
        quote_ident(&column.name),
        column_type_sql(column.column_type)
    );

    if !column.nullable {
        sql.push_str(" NOT NULL");
    }

    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&literal(default));
    }

    sql
}

/// Deterministic name for the unique index backing a UNIQUE constraint.
pub(crate) fn unique_index_name(table: &str, column: &str) -> String {
    format!("{}_{}_unique", table, column)
}

/// Render the CREATE TABLE statement for a column list.
pub(crate) fn create_table_sql(table: &str, columns: &[ColumnDescriptor]) -> String {
    let defs: Vec<String> = columns.iter().map(render_column).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table),
        defs.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(literal(&StorageValue::Null), "NULL");
        assert_eq!(literal(&StorageValue::Int(-7)), "-7");
        assert_eq!(literal(&StorageValue::Bool(true)), "1");
        assert_eq!(literal(&StorageValue::Text("it's".into())), "'it''s'");
        assert_eq!(literal(&StorageValue::Bytes(vec![0xDE, 0xAD])), "X'DEAD'");
    }

    #[test]
    fn test_render_primary_key_column() {
        let column = ColumnDescriptor::new("id", ColumnType::Integer).with_primary_key();
        assert_eq!(
            render_column(&column),
            "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"
        );
    }

    #[test]
    fn test_render_plain_columns() {
        let column = ColumnDescriptor::new("name", ColumnType::Text).with_unique();
        assert_eq!(render_column(&column), "\"name\" TEXT NOT NULL UNIQUE");

        let column = ColumnDescriptor::new("age", ColumnType::Integer)
            .with_nullable()
            .with_default(StorageValue::Int(0));
        assert_eq!(render_column(&column), "\"age\" INTEGER DEFAULT 0");
    }

    #[test]
    fn test_render_added_column_skips_unique() {
        let column = ColumnDescriptor::new("email", ColumnType::Text)
            .with_nullable()
            .with_unique();
        assert_eq!(render_added_column(&column), "\"email\" TEXT");
    }

    #[test]
    fn test_create_table_sql() {
        let columns = vec![
            ColumnDescriptor::new("id", ColumnType::Integer).with_primary_key(),
            ColumnDescriptor::new("payload", ColumnType::Binary).with_nullable(),
        ];
        assert_eq!(
            create_table_sql("things", &columns),
            "CREATE TABLE IF NOT EXISTS \"things\" \
             (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \"payload\" BLOB)"
        );
    }
}
