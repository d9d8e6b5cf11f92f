//! Migration execution against a storage engine.

use super::classify::destructive_steps;
use super::error::MigrationError;
use super::step::Migration;
use crate::engine::StorageEngine;
use crate::schema::ColumnDescriptor;
use tracing::{debug, info};

/// Create a table from a column list.
///
/// Used only when the table does not yet exist; a single DDL statement,
/// no destructiveness concerns.
pub fn create_table<E: StorageEngine + ?Sized>(
    engine: &mut E,
    table: &str,
    columns: &[ColumnDescriptor],
) -> Result<(), MigrationError> {
    for column in columns {
        column
            .validate()
            .map_err(|e| MigrationError::InvalidMigration {
                reason: e.to_string(),
            })?;
    }

    engine.create_table(table, columns)?;
    info!(table, columns = columns.len(), "created table");
    Ok(())
}

/// Execute a migration's steps, in order, against the target table.
///
/// The destructiveness gate is evaluated up front over the whole step
/// list: a destructive migration without `force` is rejected before any
/// engine call. A failing step aborts the remainder; whether steps
/// already applied are undone is the engine's atomic-unit contract, not
/// this function's.
pub fn execute<E: StorageEngine + ?Sized>(
    engine: &mut E,
    migration: &Migration,
    force: bool,
) -> Result<(), MigrationError> {
    migration.validate()?;

    let risks = destructive_steps(migration);
    if !risks.is_empty() && !force {
        return Err(MigrationError::DestructiveMigrationRejected {
            table: migration.table.clone(),
            reasons: risks
                .iter()
                .map(|r| format!("step {}: {} ({})", r.index, r.description, r.reason))
                .collect(),
        });
    }

    info!(
        table = %migration.table,
        steps = migration.len(),
        forced = force,
        "applying migration"
    );

    engine.begin()?;

    for (index, step) in migration.steps.iter().enumerate() {
        debug!(table = %migration.table, step = %step.describe(), "applying step");

        if let Err(cause) = engine.apply_step(&migration.table, step) {
            // Ask the engine to abort its unit of work; its atomicity
            // contract covers the steps already applied.
            let _ = engine.rollback();
            return Err(MigrationError::StepFailed {
                index,
                step: step.describe(),
                source: cause,
            });
        }
    }

    engine.commit()?;
    Ok(())
}
