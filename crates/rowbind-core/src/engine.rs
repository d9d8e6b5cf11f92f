//! Storage engine boundary.

use crate::error::EngineError;
use crate::migration::MigrationStep;
use crate::schema::ColumnDescriptor;
use crate::value::{Row, StorageValue};

/// Backend surface consumed by the migration executor and the binding
/// layer.
///
/// Implementations own the connection and the transaction boundary:
/// the executor brackets a migration's steps with [`begin`] and
/// [`commit`] (or [`rollback`] after a failed step), and the engine
/// must make that unit atomic — all of a migration's steps take effect
/// or none do.
///
/// Row cells cross this boundary as [`StorageValue`]s; backends may
/// hand integers back for booleans, timestamps, and integral reals,
/// which the codec re-tags on decode.
///
/// [`begin`]: StorageEngine::begin
/// [`commit`]: StorageEngine::commit
/// [`rollback`]: StorageEngine::rollback
pub trait StorageEngine {
    /// Check whether a table exists.
    fn table_exists(&mut self, table: &str) -> Result<bool, EngineError>;

    /// Create a table from a column list.
    fn create_table(&mut self, table: &str, columns: &[ColumnDescriptor])
        -> Result<(), EngineError>;

    /// Apply one migration step to a table.
    fn apply_step(&mut self, table: &str, step: &MigrationStep) -> Result<(), EngineError>;

    /// Open a unit of work.
    fn begin(&mut self) -> Result<(), EngineError>;

    /// Commit the current unit of work.
    fn commit(&mut self) -> Result<(), EngineError>;

    /// Abort the current unit of work.
    fn rollback(&mut self) -> Result<(), EngineError>;

    /// Insert a row and return the backend's generated row id.
    ///
    /// `Null` cells are omitted from the statement so column defaults
    /// apply.
    fn insert(&mut self, table: &str, row: &Row) -> Result<i64, EngineError>;

    /// Select full rows matching every `filter` conjunct, cells in
    /// table column order. An empty filter selects all rows.
    fn select(
        &mut self,
        table: &str,
        filter: &[(String, StorageValue)],
    ) -> Result<Vec<Vec<StorageValue>>, EngineError>;

    /// Update the row addressed by `key_column`'s cell in `row`,
    /// setting every other cell.
    fn update(&mut self, table: &str, row: &Row, key_column: &str) -> Result<(), EngineError>;

    /// Delete rows where `key_column` equals `key`.
    fn delete(
        &mut self,
        table: &str,
        key_column: &str,
        key: &StorageValue,
    ) -> Result<(), EngineError>;
}
