//! Field definitions and their primitive types.
//!
//! A [`SchemaNode`] describes one field of a configuration document: its
//! name, primitive [`FieldType`], whether it may be absent, whether it
//! holds an array, and (for objects) the fields nested inside it. Nodes
//! are produced from raw JSON definitions by [`parse_node`] and are
//! immutable afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StructuralError;

/// Primitive kind of a schema field.
///
/// Serialized in lowercase (`"string"`, `"number"`, `"boolean"`,
/// `"object"`), matching the `type` key of a raw field definition.
///
/// # Examples
///
/// ```
/// use config_schema_core::FieldType;
/// use serde_json::json;
///
/// assert_eq!(FieldType::from_name("number"), Some(FieldType::Number));
/// assert_eq!(FieldType::from_name("integer"), None);
///
/// assert_eq!(FieldType::of(&json!("x")), FieldType::String);
/// assert_eq!(FieldType::of(&json!([1, 2])), FieldType::Object);
/// assert_eq!(FieldType::of(&json!(null)), FieldType::Object);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
}

impl FieldType {
    /// Every accepted field type, in declaration order.
    pub const ALL: [FieldType; 4] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Object,
    ];

    /// Looks up a field type by its schema name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.as_str() == name)
    }

    /// Returns the schema name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
        }
    }

    /// Classifies a document value.
    ///
    /// Arrays and `null` classify as [`FieldType::Object`], so an element
    /// of an `object` array may be an array or `null`. A `null` has no
    /// entries: required children of a `null` object are missing.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => FieldType::String,
            Value::Number(_) => FieldType::Number,
            Value::Bool(_) => FieldType::Boolean,
            Value::Object(_) | Value::Array(_) | Value::Null => FieldType::Object,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field definition in a schema tree.
///
/// Children are only consulted during validation when the field type is
/// [`FieldType::Object`] and the field is not an array. Sibling-name
/// uniqueness is enforced when nodes are assembled into a
/// [`SchemaTree`](crate::SchemaTree), not here.
///
/// # Examples
///
/// ```
/// use config_schema_core::{FieldType, SchemaNode};
///
/// let server = SchemaNode::new("server", FieldType::Object)
///     .with_child(SchemaNode::new("host", FieldType::String))
///     .with_child(SchemaNode::new("port", FieldType::Number).optional());
///
/// assert_eq!(server.name(), "server");
/// assert_eq!(server.children().len(), 2);
/// assert!(server.child("port").unwrap().is_optional());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaNode {
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    is_array: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<SchemaNode>,
    /// Set only on the synthetic root of a tree.
    #[serde(default, skip_serializing_if = "is_false")]
    ignore: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl SchemaNode {
    /// Creates a required, non-array field with no children.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            optional: false,
            is_array: false,
            children: Vec::new(),
            ignore: false,
        }
    }

    /// Creates the synthetic root that holds a tree's top-level fields.
    pub(crate) fn root(children: Vec<SchemaNode>) -> Self {
        Self {
            name: String::new(),
            field_type: FieldType::Object,
            optional: false,
            is_array: false,
            children,
            ignore: true,
        }
    }

    /// Marks the field as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Marks the field as an array of its field type.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Appends a nested field.
    pub fn with_child(mut self, child: SchemaNode) -> Self {
        self.children.push(child);
        self
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared primitive type.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Whether the field may be absent from a document.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether the field holds an array of [`field_type`](Self::field_type).
    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// Whether this node is a tree root that skips its own type check.
    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    /// Nested field definitions, in declaration order.
    pub fn children(&self) -> &[SchemaNode] {
        &self.children
    }

    /// Finds a direct child by name.
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Parses a raw field definition.
///
/// The definition must be a JSON object with a string `name` and a `type`
/// drawn from `string`, `number`, `boolean`, `object`. `optional` and
/// `is_array` default to `false` and must be booleans when present.
/// `children`, when present, must be an array of definitions, each parsed
/// recursively. Unrecognized keys are ignored. Duplicate child names are
/// not checked here.
///
/// # Errors
///
/// Returns the first [`StructuralError`] found. Parsing never panics on
/// malformed input.
///
/// # Examples
///
/// ```
/// use config_schema_core::{FieldType, parse_node};
/// use serde_json::json;
///
/// let node = parse_node(&json!({"name": "tags", "type": "string", "is_array": true})).unwrap();
/// assert_eq!(node.field_type(), FieldType::String);
/// assert!(node.is_array());
/// assert!(!node.is_optional());
///
/// assert!(parse_node(&json!({"name": "tags"})).is_err());
/// assert!(parse_node(&json!({"name": "tags", "type": "date"})).is_err());
/// ```
pub fn parse_node(raw: &Value) -> Result<SchemaNode, StructuralError> {
    parse_node_at(raw, "definition")
}

pub(crate) fn parse_node_at(raw: &Value, path: &str) -> Result<SchemaNode, StructuralError> {
    let map = raw.as_object().ok_or_else(|| StructuralError::NotAMapping {
        path: path.to_string(),
    })?;

    let name = required_str(map, "name", path)?;
    if name.is_empty() {
        return Err(StructuralError::EmptyName {
            path: path.to_string(),
        });
    }

    let type_name = required_str(map, "type", path)?;
    let field_type =
        FieldType::from_name(type_name).ok_or_else(|| StructuralError::UnknownType {
            path: path.to_string(),
            found: type_name.to_string(),
        })?;

    let optional = optional_bool(map, "optional", path)?;
    let is_array = optional_bool(map, "is_array", path)?;

    let children = match map.get("children") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_node_at(item, &format!("{path}.children[{i}]")))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(StructuralError::WrongKeyType {
                path: path.to_string(),
                key: "children",
                expected: "sequence",
            });
        }
    };

    Ok(SchemaNode {
        name: name.to_string(),
        field_type,
        optional,
        is_array,
        children,
        ignore: false,
    })
}

fn required_str<'a>(
    map: &'a Map<String, Value>,
    key: &'static str,
    path: &str,
) -> Result<&'a str, StructuralError> {
    match map.get(key) {
        None => Err(StructuralError::MissingKey {
            path: path.to_string(),
            key,
        }),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(StructuralError::WrongKeyType {
            path: path.to_string(),
            key,
            expected: "string",
        }),
    }
}

fn optional_bool(
    map: &Map<String, Value>,
    key: &'static str,
    path: &str,
) -> Result<bool, StructuralError> {
    match map.get(key) {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(StructuralError::WrongKeyType {
            path: path.to_string(),
            key,
            expected: "boolean",
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_node_reproduces_definition() {
        for ty in FieldType::ALL {
            for optional in [false, true] {
                for is_array in [false, true] {
                    let raw = json!({
                        "name": "field",
                        "type": ty.as_str(),
                        "optional": optional,
                        "is_array": is_array,
                    });
                    let node = parse_node(&raw).unwrap();
                    assert_eq!(node.name(), "field");
                    assert_eq!(node.field_type(), ty);
                    assert_eq!(node.is_optional(), optional);
                    assert_eq!(node.is_array(), is_array);
                    assert!(!node.is_ignored());
                }
            }
        }
    }

    #[test]
    fn test_parse_node_defaults_flags() {
        let node = parse_node(&json!({"name": "a", "type": "string"})).unwrap();
        assert!(!node.is_optional());
        assert!(!node.is_array());
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_parse_node_rejects_unrelated_keys_only() {
        let node = parse_node(&json!({"a": 1}));
        assert_eq!(
            node,
            Err(StructuralError::MissingKey {
                path: "definition".to_string(),
                key: "name",
            })
        );
    }

    #[test]
    fn test_parse_node_ignores_unknown_keys() {
        let raw = json!({
            "name": "abc",
            "type": "object",
            "optional": true,
            "is_array": false,
            "ff": "as",
            "vv": 1,
            "c": false,
            "children": [
                {"name": "abc", "type": "string"},
                {"name": "ab", "type": "string"},
            ],
        });
        let node = parse_node(&raw).unwrap();
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.child("ab").unwrap().field_type(), FieldType::String);
    }

    #[test]
    fn test_parse_node_missing_type() {
        let err = parse_node(&json!({"name": "a"})).unwrap_err();
        assert!(matches!(err, StructuralError::MissingKey { key: "type", .. }));
    }

    #[test]
    fn test_parse_node_unknown_type() {
        let err = parse_node(&json!({"name": "a", "type": "integer"})).unwrap_err();
        assert_eq!(
            err,
            StructuralError::UnknownType {
                path: "definition".to_string(),
                found: "integer".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_node_wrong_key_types() {
        let cases = [
            (json!({"name": 7, "type": "string"}), "name"),
            (json!({"name": "a", "type": true}), "type"),
            (json!({"name": "a", "type": "string", "optional": "yes"}), "optional"),
            (json!({"name": "a", "type": "string", "is_array": 1}), "is_array"),
            (json!({"name": "a", "type": "object", "children": {}}), "children"),
        ];
        for (raw, expected_key) in cases {
            match parse_node(&raw) {
                Err(StructuralError::WrongKeyType { key, .. }) => assert_eq!(key, expected_key),
                other => panic!("expected WrongKeyType for {expected_key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_node_rejects_non_mapping_and_empty_name() {
        assert!(matches!(
            parse_node(&json!(["name", "type"])),
            Err(StructuralError::NotAMapping { .. })
        ));
        assert!(matches!(
            parse_node(&json!({"name": "", "type": "string"})),
            Err(StructuralError::EmptyName { .. })
        ));
    }

    #[test]
    fn test_parse_node_invalid_child_invalidates_parent() {
        let raw = json!({
            "name": "outer",
            "type": "object",
            "children": [
                {"name": "ok", "type": "string"},
                {"name": "bad", "type": "list"},
            ],
        });
        let err = parse_node(&raw).unwrap_err();
        assert_eq!(err.path(), Some("definition.children[1]"));
    }

    #[test]
    fn test_parse_node_keeps_children_of_primitive() {
        let raw = json!({
            "name": "abc",
            "type": "string",
            "children": [{"name": "x", "type": "number"}],
        });
        let node = parse_node(&raw).unwrap();
        assert_eq!(node.field_type(), FieldType::String);
        assert_eq!(node.children().len(), 1);
    }

    #[test]
    fn test_parse_node_allows_duplicate_children() {
        let raw = json!({
            "name": "o",
            "type": "object",
            "children": [{"name": "x", "type": "number"}, {"name": "x", "type": "string"}],
        });
        assert!(parse_node(&raw).is_ok());
    }

    #[test]
    fn test_field_type_of_values() {
        assert_eq!(FieldType::of(&json!(1.5)), FieldType::Number);
        assert_eq!(FieldType::of(&json!(false)), FieldType::Boolean);
        assert_eq!(FieldType::of(&json!({"k": 1})), FieldType::Object);
        assert_eq!(FieldType::of(&json!([])), FieldType::Object);
        assert_eq!(FieldType::of(&Value::Null), FieldType::Object);
    }

    #[test]
    fn test_field_type_serializes_lowercase() {
        let raw = serde_json::to_string(&FieldType::Boolean).unwrap();
        assert_eq!(raw, "\"boolean\"");
    }
}
