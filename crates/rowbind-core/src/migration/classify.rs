//! Destructiveness classification for migrations.
//!
//! Classification is a pure function over the step list; it never
//! queries current table state. Widening steps (dropping constraints
//! other than the primary key) are safe, narrowing and removal steps
//! are destructive.

use super::step::{ConstraintKind, Migration, MigrationStep};

/// Safety classification for a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Safety {
    /// Applicable without confirmation.
    Safe,
    /// Can lose data or relax an integrity guarantee; requires
    /// explicit confirmation.
    Destructive,
}

impl std::fmt::Display for Safety {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Safety::Safe => write!(f, "safe"),
            Safety::Destructive => write!(f, "destructive"),
        }
    }
}

/// Why a single step was classified destructive.
#[derive(Debug, Clone)]
pub struct StepRisk {
    /// Index of the step in the migration.
    pub index: usize,
    /// Description of the step.
    pub description: String,
    /// Reasoning for the classification.
    pub reason: String,
}

/// The destructive reason for one step, if any.
fn step_risk(step: &MigrationStep) -> Option<&'static str> {
    match step {
        MigrationStep::RemoveColumn { .. } => Some("removing a column destroys its data"),
        MigrationStep::RemoveConstraint {
            constraint: ConstraintKind::PrimaryKey,
            ..
        } => Some("dropping a primary key relaxes the table's identity guarantee"),
        MigrationStep::AddConstraint {
            constraint: ConstraintKind::NotNull,
            fill: None,
            ..
        } => Some("existing NULL rows have no fill value"),
        _ => None,
    }
}

/// List every destructive step with its reason.
pub fn destructive_steps(migration: &Migration) -> Vec<StepRisk> {
    migration
        .steps
        .iter()
        .enumerate()
        .filter_map(|(index, step)| {
            step_risk(step).map(|reason| StepRisk {
                index,
                description: step.describe(),
                reason: reason.to_string(),
            })
        })
        .collect()
}

/// Classify a migration's overall safety.
pub fn classify(migration: &Migration) -> Safety {
    if migration.steps.iter().any(|s| step_risk(s).is_some()) {
        Safety::Destructive
    } else {
        Safety::Safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, ColumnType};
    use crate::value::StorageValue;

    #[test]
    fn test_safe_migration() {
        let migration = Migration::new(
            "t",
            vec![
                MigrationStep::rename("a", "b"),
                MigrationStep::add_column(
                    ColumnDescriptor::new("c", ColumnType::Text)
                        .with_nullable()
                        .with_default(StorageValue::Text("x".into())),
                ),
            ],
        );

        assert_eq!(classify(&migration), Safety::Safe);
        assert!(destructive_steps(&migration).is_empty());
    }

    #[test]
    fn test_remove_column_is_destructive() {
        let migration = Migration::new("t", vec![MigrationStep::remove_column("old")]);
        assert_eq!(classify(&migration), Safety::Destructive);
    }

    #[test]
    fn test_remove_primary_key_is_destructive() {
        let migration = Migration::new(
            "t",
            vec![MigrationStep::remove_constraint(
                "id",
                ConstraintKind::PrimaryKey,
            )],
        );
        assert_eq!(classify(&migration), Safety::Destructive);
    }

    #[test]
    fn test_widening_constraint_removal_is_safe() {
        let migration = Migration::new(
            "t",
            vec![
                MigrationStep::remove_constraint("a", ConstraintKind::NotNull),
                MigrationStep::remove_constraint("b", ConstraintKind::Unique),
            ],
        );
        assert_eq!(classify(&migration), Safety::Safe);
    }

    #[test]
    fn test_not_null_without_fill_is_destructive() {
        let migration = Migration::new(
            "t",
            vec![MigrationStep::add_constraint("a", ConstraintKind::NotNull)],
        );
        assert_eq!(classify(&migration), Safety::Destructive);

        let risks = destructive_steps(&migration);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].index, 0);
    }

    #[test]
    fn test_not_null_with_fill_is_safe() {
        let migration = Migration::new(
            "t",
            vec![MigrationStep::add_constraint_filled(
                "a",
                ConstraintKind::NotNull,
                StorageValue::Int(0),
            )],
        );
        assert_eq!(classify(&migration), Safety::Safe);
    }

    #[test]
    fn test_one_destructive_step_taints_the_migration() {
        let migration = Migration::new(
            "t",
            vec![
                MigrationStep::rename("a", "b"),
                MigrationStep::remove_column("c"),
                MigrationStep::rename("d", "e"),
            ],
        );

        assert_eq!(classify(&migration), Safety::Destructive);
        let risks = destructive_steps(&migration);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].index, 1);
    }
}
