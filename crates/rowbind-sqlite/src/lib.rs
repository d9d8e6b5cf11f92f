//! SQLite storage engine for rowbind.
//!
//! [`SqliteEngine`] implements the core's
//! [`StorageEngine`](rowbind_core::StorageEngine) trait over a
//! `rusqlite` connection. Column alterations SQLite cannot express with
//! `ALTER TABLE` (constraint toggles) go through a table rebuild:
//! create the reshaped table, copy rows, drop the old one, rename.

mod ddl;
mod engine;

pub use engine::SqliteEngine;
