//! Type schema nodes and record instances.
//!
//! A [`RecordSchema`] is an explicit, serializable description of a
//! record type's fields and declared types. Callers construct it
//! directly; nothing here depends on a reflection API.

use crate::value::FieldValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Primitive type tags recognized by the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// Signed integer.
    Integer,
    /// UTF-8 string.
    Text,
    /// Floating point number.
    Float,
    /// Boolean.
    Boolean,
    /// Date-time instant.
    DateTime,
}

/// Structural description of one field's declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeNode {
    /// The null marker inside a union.
    Null,
    /// A primitive type tag.
    Primitive(PrimitiveType),
    /// A union of member types. Only the two-member form with exactly
    /// one null marker (an optional) is translatable; any other shape
    /// is rejected by the translator.
    Union(Vec<TypeNode>),
    /// Homogeneous sequence.
    List(Box<TypeNode>),
    /// Fixed-arity tuple.
    Tuple(Vec<TypeNode>),
    /// Unordered collection of distinct values.
    Set(Box<TypeNode>),
    /// String-keyed mapping.
    Map(Box<TypeNode>),
    /// A nested record type, referenced by name.
    Record(String),
    /// Raw byte sequence.
    Bytes,
}

impl TypeNode {
    /// Shorthand for the optional wrapping of a type.
    pub fn optional(inner: TypeNode) -> Self {
        TypeNode::Union(vec![inner, TypeNode::Null])
    }

    /// Shorthand for a primitive node.
    pub fn primitive(tag: PrimitiveType) -> Self {
        TypeNode::Primitive(tag)
    }

    /// Check if this node is the null marker.
    pub fn is_null(&self) -> bool {
        matches!(self, TypeNode::Null)
    }
}

/// One field's declared type plus its declared default, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Declared type.
    pub node: TypeNode,
    /// Declared default value, not yet encoded.
    pub default: Option<FieldValue>,
}

impl FieldSchema {
    /// Create a field schema with no default.
    pub fn new(node: TypeNode) -> Self {
        Self {
            node,
            default: None,
        }
    }

    /// Set the declared default.
    pub fn with_default(mut self, default: impl Into<FieldValue>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Ordered field-name to type-descriptor mapping for one record type.
///
/// Declaration order is semantically meaningful: it fixes the positional
/// correspondence between columns and row tuples used by the codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Record type name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: IndexMap<String, FieldSchema>,
}

impl RecordSchema {
    /// Create an empty record schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field with no default.
    pub fn with_field(mut self, name: impl Into<String>, node: TypeNode) -> Self {
        self.fields.insert(name.into(), FieldSchema::new(node));
        self
    }

    /// Add a field with a declared default.
    pub fn with_defaulted_field(
        mut self,
        name: impl Into<String>,
        node: TypeNode,
        default: impl Into<FieldValue>,
    ) -> Self {
        self.fields
            .insert(name.into(), FieldSchema::new(node).with_default(default));
        self
    }

    /// Get a field schema by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A concrete record instance: a name-to-value mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    /// Field values in insertion order.
    pub fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from name-value pairs.
    pub fn from_fields(
        fields: impl IntoIterator<Item = (String, FieldValue)>,
    ) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Set a field, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a field in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Record equality treats an unset field and a field set to null as the
/// same state, so a record survives an encode/decode round trip even
/// when unset optionals come back as explicit nulls.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        let non_null = |r: &Record| {
            r.fields
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<IndexMap<_, _>>()
        };
        non_null(self) == non_null(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_builder_preserves_order() {
        let schema = RecordSchema::new("User")
            .with_field("id", TypeNode::primitive(PrimitiveType::Integer))
            .with_field("name", TypeNode::primitive(PrimitiveType::Text))
            .with_defaulted_field(
                "active",
                TypeNode::primitive(PrimitiveType::Boolean),
                true,
            );

        let names: Vec<_> = schema.fields.keys().cloned().collect();
        assert_eq!(names, vec!["id", "name", "active"]);
        assert!(schema.field("active").and_then(|f| f.default.as_ref()).is_some());
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn test_optional_shorthand() {
        let node = TypeNode::optional(TypeNode::primitive(PrimitiveType::Integer));
        if let TypeNode::Union(members) = &node {
            assert_eq!(members.len(), 2);
            assert!(members[1].is_null());
        } else {
            panic!("expected union");
        }
    }

    #[test]
    fn test_record_builder() {
        let record = Record::new()
            .with("id", 1i64)
            .with("name", "alice");

        assert_eq!(record.get("id"), Some(&FieldValue::Int(1)));
        assert_eq!(record.get("name"), Some(&FieldValue::Text("alice".into())));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_record_equality_ignores_unset_nulls() {
        let a = Record::new().with("id", 1i64);
        let b = Record::new().with("id", 1i64).with("extra", FieldValue::Null);

        assert_eq!(a, b);

        let c = Record::new().with("id", 2i64);
        assert_ne!(a, c);
    }
}
