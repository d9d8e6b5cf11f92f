//! Migration step vocabulary.

use super::error::MigrationError;
use crate::schema::ColumnDescriptor;
use crate::value::StorageValue;
use serde::{Deserialize, Serialize};

/// Constraint kinds a migration step can add or remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// The column rejects NULL.
    NotNull,
    /// The column's values are unique.
    Unique,
    /// The column is the table's primary key.
    PrimaryKey,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConstraintKind::NotNull => "NOT NULL",
            ConstraintKind::Unique => "UNIQUE",
            ConstraintKind::PrimaryKey => "PRIMARY KEY",
        };
        write!(f, "{}", name)
    }
}

/// One table-alteration operation.
///
/// Pure data; applied strictly in the order given, with no implicit
/// reordering or deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MigrationStep {
    /// Rename an existing column.
    RenameColumn {
        /// Current column name.
        from: String,
        /// New column name.
        to: String,
    },
    /// Add a new column described by a full descriptor.
    AddColumn {
        /// The column to add.
        descriptor: ColumnDescriptor,
    },
    /// Remove a column and the data it holds.
    RemoveColumn {
        /// The column to remove.
        name: String,
    },
    /// Add a constraint to an existing column. `fill` supplies the
    /// value written into existing NULL rows when adding `NotNull`.
    AddConstraint {
        /// The column to constrain.
        column: String,
        /// The constraint to add.
        constraint: ConstraintKind,
        /// Fill value for existing rows, storage representation.
        fill: Option<StorageValue>,
    },
    /// Remove a constraint from a column.
    RemoveConstraint {
        /// The constrained column.
        column: String,
        /// The constraint to remove.
        constraint: ConstraintKind,
    },
}

impl MigrationStep {
    /// Create a rename step.
    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        MigrationStep::RenameColumn {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create an add-column step.
    pub fn add_column(descriptor: ColumnDescriptor) -> Self {
        MigrationStep::AddColumn { descriptor }
    }

    /// Create a remove-column step.
    pub fn remove_column(name: impl Into<String>) -> Self {
        MigrationStep::RemoveColumn { name: name.into() }
    }

    /// Create an add-constraint step with no fill value.
    pub fn add_constraint(column: impl Into<String>, constraint: ConstraintKind) -> Self {
        MigrationStep::AddConstraint {
            column: column.into(),
            constraint,
            fill: None,
        }
    }

    /// Create an add-constraint step that fills existing NULL rows.
    pub fn add_constraint_filled(
        column: impl Into<String>,
        constraint: ConstraintKind,
        fill: impl Into<StorageValue>,
    ) -> Self {
        MigrationStep::AddConstraint {
            column: column.into(),
            constraint,
            fill: Some(fill.into()),
        }
    }

    /// Create a remove-constraint step.
    pub fn remove_constraint(column: impl Into<String>, constraint: ConstraintKind) -> Self {
        MigrationStep::RemoveConstraint {
            column: column.into(),
            constraint,
        }
    }

    /// Human-readable description, used in logs and errors.
    pub fn describe(&self) -> String {
        match self {
            MigrationStep::RenameColumn { from, to } => {
                format!("rename column '{}' to '{}'", from, to)
            }
            MigrationStep::AddColumn { descriptor } => {
                format!("add column '{}'", descriptor.name)
            }
            MigrationStep::RemoveColumn { name } => format!("remove column '{}'", name),
            MigrationStep::AddConstraint {
                column, constraint, ..
            } => format!("add {} on '{}'", constraint, column),
            MigrationStep::RemoveConstraint { column, constraint } => {
                format!("remove {} from '{}'", constraint, column)
            }
        }
    }

    /// Check the step's own invariants.
    pub fn validate(&self) -> Result<(), MigrationError> {
        match self {
            MigrationStep::RenameColumn { from, to } if from == to => {
                Err(MigrationError::InvalidMigration {
                    reason: format!("rename of '{}' to itself", from),
                })
            }
            MigrationStep::AddColumn { descriptor } => {
                descriptor
                    .validate()
                    .map_err(|e| MigrationError::InvalidMigration {
                        reason: e.to_string(),
                    })
            }
            _ => Ok(()),
        }
    }
}

/// An ordered, explicit schema delta for one table.
///
/// Short-lived: constructed by a caller, consumed once by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    /// The table to alter.
    pub table: String,
    /// Steps in application order.
    pub steps: Vec<MigrationStep>,
}

impl Migration {
    /// Create a migration from an ordered step list.
    pub fn new(table: impl Into<String>, steps: Vec<MigrationStep>) -> Self {
        Self {
            table: table.into(),
            steps,
        }
    }

    /// Append a step, builder style.
    pub fn with_step(mut self, step: MigrationStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Check every step's invariants.
    pub fn validate(&self) -> Result<(), MigrationError> {
        for step in &self.steps {
            step.validate()?;
        }
        Ok(())
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the migration has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    #[test]
    fn test_step_constructors() {
        let step = MigrationStep::rename("a", "b");
        assert_eq!(step.describe(), "rename column 'a' to 'b'");

        let step = MigrationStep::add_constraint_filled(
            "status",
            ConstraintKind::NotNull,
            StorageValue::Text("new".into()),
        );
        if let MigrationStep::AddConstraint { fill, .. } = &step {
            assert!(fill.is_some());
        } else {
            panic!("expected add constraint");
        }
    }

    #[test]
    fn test_rename_to_itself_is_invalid() {
        let migration = Migration::new("t", vec![MigrationStep::rename("a", "a")]);
        assert!(matches!(
            migration.validate(),
            Err(MigrationError::InvalidMigration { .. })
        ));
    }

    #[test]
    fn test_add_column_validates_descriptor() {
        let mut descriptor =
            ColumnDescriptor::new("id", ColumnType::Integer).with_primary_key();
        descriptor.nullable = true;

        let migration = Migration::new("t", vec![MigrationStep::add_column(descriptor)]);
        assert!(matches!(
            migration.validate(),
            Err(MigrationError::InvalidMigration { .. })
        ));
    }

    #[test]
    fn test_steps_keep_their_order() {
        let migration = Migration::new("t", Vec::new())
            .with_step(MigrationStep::rename("a", "b"))
            .with_step(MigrationStep::remove_column("c"))
            .with_step(MigrationStep::rename("b", "a"));

        let described: Vec<_> = migration.steps.iter().map(|s| s.describe()).collect();
        assert_eq!(
            described,
            vec![
                "rename column 'a' to 'b'",
                "remove column 'c'",
                "rename column 'b' to 'a'",
            ]
        );
        assert_eq!(migration.len(), 3);
    }
}
