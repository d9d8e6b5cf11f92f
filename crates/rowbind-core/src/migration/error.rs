//! Migration-specific error types.

use crate::error::EngineError;
use thiserror::Error;

/// Errors from classifying or executing a migration.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The migration contains destructive steps and `force` was not
    /// set. No steps have been applied; re-invoke with `force = true`
    /// to proceed.
    #[error("destructive migration rejected for table '{table}': {}", .reasons.join("; "))]
    DestructiveMigrationRejected {
        /// The table targeted by the migration.
        table: String,
        /// One line per destructive step.
        reasons: Vec<String>,
    },

    /// A step failed against the storage engine. Steps after it were
    /// not attempted; steps before it are covered by the engine's
    /// atomic unit of work.
    #[error("migration step {index} ({step}) failed: {source}")]
    StepFailed {
        /// Index of the failed step.
        index: usize,
        /// Description of the failed step.
        step: String,
        /// The underlying engine failure.
        #[source]
        source: EngineError,
    },

    /// The step list itself is malformed.
    #[error("invalid migration: {reason}")]
    InvalidMigration {
        /// Which rule the migration violates.
        reason: String,
    },

    /// Engine failure outside any single step (unit-of-work control,
    /// table creation).
    #[error("storage engine error: {0}")]
    Engine(#[from] EngineError),
}
