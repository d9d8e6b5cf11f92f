//! Record type schemas and their translation into column lists.

pub mod column;
pub mod record;
pub mod translate;

pub use column::{ColumnDescriptor, ColumnType};
pub use record::{FieldSchema, PrimitiveType, Record, RecordSchema, TypeNode};
pub use translate::translate;
