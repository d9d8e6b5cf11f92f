//! Translation of record type schemas into canonical column lists.

use super::column::{ColumnDescriptor, ColumnType};
use super::record::{PrimitiveType, RecordSchema, TypeNode};
use crate::codec;
use crate::error::SchemaError;
use crate::value::{FieldValue, StorageValue};
use std::collections::HashSet;
use tracing::debug;

/// Fixed mapping from primitive tags to logical column types.
fn primitive_column_type(tag: PrimitiveType) -> ColumnType {
    match tag {
        PrimitiveType::Integer => ColumnType::Integer,
        PrimitiveType::Text => ColumnType::Text,
        PrimitiveType::Float => ColumnType::Real,
        PrimitiveType::Boolean => ColumnType::Boolean,
        PrimitiveType::DateTime => ColumnType::Timestamp,
    }
}

/// Column type and inferred nullability for one resolved type node.
struct ResolvedType {
    column_type: ColumnType,
    nullable: bool,
}

/// Resolve a type node to its column type.
///
/// Primitives map through the fixed table. A two-member union with
/// exactly one null marker unwraps to its non-null member and turns
/// nullable. Everything else is the opaque binary fallback, applied
/// exactly once and never an error.
fn resolve_node(field: &str, node: &TypeNode) -> Result<ResolvedType, SchemaError> {
    match node {
        TypeNode::Primitive(tag) => Ok(ResolvedType {
            column_type: primitive_column_type(*tag),
            nullable: false,
        }),
        TypeNode::Union(members) => {
            if members.len() != 2 {
                return Err(SchemaError::AmbiguousUnionType {
                    field: field.to_string(),
                    reason: format!("expected 2 members, found {}", members.len()),
                });
            }
            let null_members = members.iter().filter(|m| m.is_null()).count();
            if null_members != 1 {
                return Err(SchemaError::AmbiguousUnionType {
                    field: field.to_string(),
                    reason: format!(
                        "expected exactly one null member, found {}",
                        null_members
                    ),
                });
            }
            let inner = members
                .iter()
                .find(|m| !m.is_null())
                .ok_or_else(|| SchemaError::AmbiguousUnionType {
                    field: field.to_string(),
                    reason: "union has no non-null member".to_string(),
                })?;
            let column_type = match inner {
                TypeNode::Primitive(tag) => primitive_column_type(*tag),
                _ => ColumnType::Binary,
            };
            Ok(ResolvedType {
                column_type,
                nullable: true,
            })
        }
        _ => Ok(ResolvedType {
            column_type: ColumnType::Binary,
            nullable: false,
        }),
    }
}

/// Pre-encode a declared default into the column's storage representation.
///
/// Binary defaults go through the codec's opaque encoding so the stored
/// default is directly comparable to encoded instance values.
fn encode_default(
    field: &str,
    column_type: ColumnType,
    default: &FieldValue,
) -> Result<StorageValue, SchemaError> {
    if column_type == ColumnType::Binary {
        let bytes =
            codec::encode_opaque(default).map_err(|e| SchemaError::InvalidColumnDescriptor {
                name: field.to_string(),
                reason: format!("default is not encodable: {}", e),
            })?;
        return Ok(StorageValue::Bytes(bytes));
    }
    codec::storage_value(field, column_type, default).map_err(|e| {
        SchemaError::InvalidColumnDescriptor {
            name: field.to_string(),
            reason: format!("default does not match column type: {}", e),
        }
    })
}

/// Translate a record schema into an ordered column list.
///
/// Fields are walked in declared order. A field named by `primary_key`
/// is forced non-nullable regardless of any optional wrapper; a
/// `primary_key` naming no declared field is an error.
pub fn translate(
    schema: &RecordSchema,
    primary_key: Option<&str>,
    unique: &HashSet<String>,
) -> Result<Vec<ColumnDescriptor>, SchemaError> {
    let mut columns = Vec::with_capacity(schema.fields.len());

    for (name, field) in &schema.fields {
        let resolved = resolve_node(name, &field.node)?;

        let default = match &field.default {
            Some(value) => Some(encode_default(name, resolved.column_type, value)?),
            None => None,
        };

        let mut column = ColumnDescriptor {
            name: name.clone(),
            column_type: resolved.column_type,
            nullable: resolved.nullable,
            default,
            primary_key: false,
            unique: false,
        };

        if primary_key == Some(name.as_str()) {
            // Primary keys are never optional.
            column.primary_key = true;
            column.nullable = false;
        }
        if unique.contains(name.as_str()) {
            column.unique = true;
        }

        column.validate()?;
        columns.push(column);
    }

    if let Some(pk) = primary_key {
        if !columns.iter().any(|c| c.primary_key) {
            return Err(SchemaError::UnknownPrimaryKey {
                name: pk.to_string(),
            });
        }
    }

    debug!(
        record = %schema.name,
        columns = columns.len(),
        "translated record schema"
    );

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::record::FieldSchema;

    fn unique_of(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_primitive_mapping() {
        let schema = RecordSchema::new("All")
            .with_field("a", TypeNode::primitive(PrimitiveType::Integer))
            .with_field("b", TypeNode::primitive(PrimitiveType::Text))
            .with_field("c", TypeNode::primitive(PrimitiveType::Float))
            .with_field("d", TypeNode::primitive(PrimitiveType::Boolean))
            .with_field("e", TypeNode::primitive(PrimitiveType::DateTime));

        let columns = translate(&schema, None, &HashSet::new()).unwrap();

        let types: Vec<_> = columns.iter().map(|c| c.column_type).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Integer,
                ColumnType::Text,
                ColumnType::Real,
                ColumnType::Boolean,
                ColumnType::Timestamp,
            ]
        );
        assert!(columns.iter().all(|c| !c.nullable));
    }

    #[test]
    fn test_optional_union_unwraps_to_nullable() {
        let schema = RecordSchema::new("User").with_field(
            "age",
            TypeNode::optional(TypeNode::primitive(PrimitiveType::Integer)),
        );

        let columns = translate(&schema, None, &HashSet::new()).unwrap();

        assert_eq!(columns[0].column_type, ColumnType::Integer);
        assert!(columns[0].nullable);
    }

    #[test]
    fn test_union_with_two_non_null_members_is_ambiguous() {
        let schema = RecordSchema::new("Bad").with_field(
            "x",
            TypeNode::Union(vec![
                TypeNode::primitive(PrimitiveType::Integer),
                TypeNode::primitive(PrimitiveType::Text),
            ]),
        );

        assert!(matches!(
            translate(&schema, None, &HashSet::new()),
            Err(SchemaError::AmbiguousUnionType { .. })
        ));
    }

    #[test]
    fn test_union_with_two_null_members_is_ambiguous() {
        let schema = RecordSchema::new("Bad")
            .with_field("x", TypeNode::Union(vec![TypeNode::Null, TypeNode::Null]));

        assert!(matches!(
            translate(&schema, None, &HashSet::new()),
            Err(SchemaError::AmbiguousUnionType { .. })
        ));
    }

    #[test]
    fn test_union_with_three_members_is_ambiguous() {
        let schema = RecordSchema::new("Bad").with_field(
            "x",
            TypeNode::Union(vec![
                TypeNode::primitive(PrimitiveType::Integer),
                TypeNode::primitive(PrimitiveType::Text),
                TypeNode::Null,
            ]),
        );

        assert!(matches!(
            translate(&schema, None, &HashSet::new()),
            Err(SchemaError::AmbiguousUnionType { .. })
        ));
    }

    #[test]
    fn test_composite_shapes_fall_back_to_binary() {
        let schema = RecordSchema::new("Blobby")
            .with_field(
                "tags",
                TypeNode::List(Box::new(TypeNode::primitive(PrimitiveType::Text))),
            )
            .with_field(
                "pair",
                TypeNode::Tuple(vec![
                    TypeNode::primitive(PrimitiveType::Integer),
                    TypeNode::primitive(PrimitiveType::Integer),
                ]),
            )
            .with_field(
                "meta",
                TypeNode::Map(Box::new(TypeNode::primitive(PrimitiveType::Text))),
            )
            .with_field(
                "labels",
                TypeNode::Set(Box::new(TypeNode::primitive(PrimitiveType::Text))),
            )
            .with_field("friend", TypeNode::Record("User".to_string()))
            .with_field("raw", TypeNode::Bytes);

        let columns = translate(&schema, None, &HashSet::new()).unwrap();

        assert!(columns.iter().all(|c| c.column_type == ColumnType::Binary));
        assert!(columns.iter().all(|c| !c.nullable));
    }

    #[test]
    fn test_optional_composite_is_nullable_binary() {
        let schema = RecordSchema::new("Blobby").with_field(
            "tags",
            TypeNode::optional(TypeNode::List(Box::new(TypeNode::primitive(
                PrimitiveType::Text,
            )))),
        );

        let columns = translate(&schema, None, &HashSet::new()).unwrap();

        assert_eq!(columns[0].column_type, ColumnType::Binary);
        assert!(columns[0].nullable);
    }

    #[test]
    fn test_primary_key_forcing_overrides_optional() {
        let schema = RecordSchema::new("User")
            .with_field(
                "pk",
                TypeNode::optional(TypeNode::primitive(PrimitiveType::Integer)),
            )
            .with_field("name", TypeNode::primitive(PrimitiveType::Text));

        let columns = translate(&schema, Some("pk"), &HashSet::new()).unwrap();

        assert!(columns[0].primary_key);
        assert!(!columns[0].nullable);
        assert_eq!(columns[0].column_type, ColumnType::Integer);
        assert!(!columns[1].primary_key);
        assert!(!columns[1].nullable);
    }

    #[test]
    fn test_unknown_primary_key() {
        let schema =
            RecordSchema::new("User").with_field("id", TypeNode::primitive(PrimitiveType::Integer));

        assert!(matches!(
            translate(&schema, Some("nope"), &HashSet::new()),
            Err(SchemaError::UnknownPrimaryKey { .. })
        ));
    }

    #[test]
    fn test_unique_fields_are_flagged() {
        let schema = RecordSchema::new("User")
            .with_field("id", TypeNode::primitive(PrimitiveType::Integer))
            .with_field("email", TypeNode::primitive(PrimitiveType::Text));

        let columns = translate(&schema, Some("id"), &unique_of(&["email"])).unwrap();

        assert!(!columns[0].unique);
        assert!(columns[1].unique);
    }

    #[test]
    fn test_primitive_default_is_converted() {
        let schema = RecordSchema::new("User").with_defaulted_field(
            "name",
            TypeNode::primitive(PrimitiveType::Text),
            "anonymous",
        );

        let columns = translate(&schema, None, &HashSet::new()).unwrap();

        assert_eq!(
            columns[0].default,
            Some(StorageValue::Text("anonymous".into()))
        );
    }

    #[test]
    fn test_binary_default_is_pre_encoded() {
        let default = FieldValue::List(vec![FieldValue::Int(1), FieldValue::Int(2)]);
        let schema = RecordSchema::new("Blobby").with_defaulted_field(
            "tags",
            TypeNode::List(Box::new(TypeNode::primitive(PrimitiveType::Integer))),
            default.clone(),
        );

        let columns = translate(&schema, None, &HashSet::new()).unwrap();

        let stored = columns[0].default.as_ref().unwrap();
        let bytes = stored.as_bytes().unwrap();
        assert_eq!(codec::decode_opaque(bytes).unwrap(), default);
    }

    #[test]
    fn test_mismatched_default_is_rejected() {
        let mut schema = RecordSchema::new("User");
        schema.fields.insert(
            "age".to_string(),
            FieldSchema::new(TypeNode::primitive(PrimitiveType::Integer))
                .with_default("not a number"),
        );

        assert!(matches!(
            translate(&schema, None, &HashSet::new()),
            Err(SchemaError::InvalidColumnDescriptor { .. })
        ));
    }
}
