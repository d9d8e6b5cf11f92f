//! rowbind core - schema translation, record codec, and guarded
//! migrations for mapping typed records onto relational tables.
//!
//! A [`RecordSchema`] describes a record type's fields structurally;
//! [`translate`] turns it into a canonical, backend-agnostic column
//! list. The codec converts record instances to and from rows using
//! that same column list, and the migration module evolves a live
//! table through explicit, destructiveness-gated steps. Storage
//! backends plug in through the [`StorageEngine`] trait.

pub mod bind;
pub mod codec;
pub mod engine;
pub mod error;
pub mod migration;
pub mod schema;
pub mod value;

pub use bind::{default_primary_key, BindOutcome, TableBinding};
pub use codec::{decode, decode_opaque, encode, encode_opaque, OPAQUE_FORMAT_VERSION};
pub use engine::StorageEngine;
pub use error::{BindError, CodecError, EngineError, SchemaError};
pub use migration::{
    classify, create_table, destructive_steps, execute, ConstraintKind, Migration, MigrationError,
    MigrationStep, Safety, StepRisk,
};
pub use schema::{
    translate, ColumnDescriptor, ColumnType, FieldSchema, PrimitiveType, Record, RecordSchema,
    TypeNode,
};
pub use value::{FieldValue, Row, StorageValue};
