//! Explicit, guarded table migrations.
//!
//! A [`Migration`] is an ordered list of steps describing a schema
//! delta. Steps are classified for destructiveness up front and only
//! applied past an explicit-confirmation gate:
//!
//! | Safety | Examples | Behavior |
//! |--------|----------|----------|
//! | **Safe** | add column with default, rename column, drop NOT NULL | applied directly |
//! | **Destructive** | remove column, drop primary key, add NOT NULL without fill | requires `force = true` |

pub mod classify;
pub mod error;
pub mod executor;
pub mod step;

pub use classify::{classify, destructive_steps, Safety, StepRisk};
pub use error::MigrationError;
pub use executor::{create_table, execute};
pub use step::{ConstraintKind, Migration, MigrationStep};
