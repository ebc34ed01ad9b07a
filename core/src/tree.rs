//! Named schema trees and their persisted form.
//!
//! A [`SchemaTree`] owns the top-level field definitions of one schema
//! under a synthetic root node. The root carries the ignore marker: the
//! validator never type-checks it, only its children.
//!
//! Every `SchemaTree` value is structurally valid. Construction
//! ([`SchemaTree::build`], [`SchemaTree::from_definition`],
//! [`SchemaTree::from_nodes`]) and deserialization
//! ([`SchemaTree::from_json`]) all run the same whole-tree check, so a
//! single defect anywhere rejects the entire schema.
//!
//! # Persisted form
//!
//! ```json
//! {
//!   "schema_id": "service",
//!   "root": {
//!     "name": "",
//!     "type": "object",
//!     "optional": false,
//!     "is_array": false,
//!     "children": [
//!       { "name": "port", "type": "number", "optional": false, "is_array": false }
//!     ],
//!     "ignore": true
//!   }
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StructuralError;
use crate::node::{SchemaNode, parse_node_at};

const BODY_PATH: &str = "schema_body";

/// A validated, immutable schema.
///
/// # Examples
///
/// ```
/// use config_schema_core::SchemaTree;
/// use serde_json::json;
///
/// let tree = SchemaTree::from_definition(&json!({
///     "schema_id": "service",
///     "schema_body": [
///         {"name": "host", "type": "string"},
///         {"name": "port", "type": "number", "optional": true},
///     ],
/// }))
/// .unwrap();
///
/// assert_eq!(tree.schema_id(), "service");
/// assert_eq!(tree.field_count(), 2);
///
/// let restored = SchemaTree::from_json(&tree.to_json().unwrap()).unwrap();
/// assert_eq!(restored, tree);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersistedTree")]
pub struct SchemaTree {
    schema_id: String,
    root: SchemaNode,
}

/// Unchecked shape of a persisted tree, verified before it becomes a
/// [`SchemaTree`].
#[derive(Deserialize)]
struct PersistedTree {
    schema_id: String,
    root: SchemaNode,
}

impl TryFrom<PersistedTree> for SchemaTree {
    type Error = StructuralError;

    fn try_from(persisted: PersistedTree) -> Result<Self, Self::Error> {
        if persisted.schema_id.is_empty() {
            return Err(StructuralError::MissingSchemaId);
        }
        if !persisted.root.is_ignored() {
            return Err(StructuralError::MisplacedIgnore {
                path: "root".to_string(),
            });
        }
        check_fields(persisted.root.children(), BODY_PATH)?;
        Ok(Self {
            schema_id: persisted.schema_id,
            root: persisted.root,
        })
    }
}

impl SchemaTree {
    /// Builds a tree from a schema id and the raw `schema_body` value.
    ///
    /// # Errors
    ///
    /// - [`StructuralError::MissingSchemaId`] if `schema_id` is empty.
    /// - [`StructuralError::BodyNotASequence`] if `body` is not an array.
    /// - Any parse error from the field definitions.
    /// - [`StructuralError::DuplicateName`] if siblings share a name at
    ///   any depth.
    pub fn build(schema_id: &str, body: &Value) -> Result<Self, StructuralError> {
        if schema_id.is_empty() {
            return Err(StructuralError::MissingSchemaId);
        }
        let definitions = body.as_array().ok_or(StructuralError::BodyNotASequence)?;

        let fields = definitions
            .iter()
            .enumerate()
            .map(|(i, raw)| parse_node_at(raw, &format!("{BODY_PATH}[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        Self::assemble(schema_id.to_string(), fields)
    }

    /// Builds a tree from a whole `{schema_id, schema_body}` definition.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build); additionally returns
    /// [`StructuralError::MissingSchemaId`] when `schema_id` is absent or
    /// not a string.
    pub fn from_definition(raw: &Value) -> Result<Self, StructuralError> {
        let schema_id = raw
            .get("schema_id")
            .and_then(Value::as_str)
            .ok_or(StructuralError::MissingSchemaId)?;
        let body = raw
            .get("schema_body")
            .ok_or(StructuralError::BodyNotASequence)?;
        Self::build(schema_id, body)
    }

    /// Builds a tree from already constructed nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty, a node has an empty name, or
    /// siblings share a name at any depth.
    pub fn from_nodes(
        schema_id: impl Into<String>,
        fields: Vec<SchemaNode>,
    ) -> Result<Self, StructuralError> {
        let schema_id = schema_id.into();
        if schema_id.is_empty() {
            return Err(StructuralError::MissingSchemaId);
        }
        Self::assemble(schema_id, fields)
    }

    fn assemble(schema_id: String, fields: Vec<SchemaNode>) -> Result<Self, StructuralError> {
        check_fields(&fields, BODY_PATH)?;
        Ok(Self {
            schema_id,
            root: SchemaNode::root(fields),
        })
    }

    /// Restores a tree from its persisted JSON text.
    ///
    /// The whole-tree check runs again, so text that was edited into an
    /// invalid schema is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::Serialization`] for malformed text and
    /// the structural variants for a well-formed but invalid tree.
    pub fn from_json(raw: &str) -> Result<Self, StructuralError> {
        let persisted: PersistedTree = serde_json::from_str(raw)
            .map_err(|err| StructuralError::Serialization(err.to_string()))?;
        Self::try_from(persisted)
    }

    /// Serializes the full tree, root included, as compact JSON.
    pub fn to_json(&self) -> Result<String, StructuralError> {
        serde_json::to_string(self).map_err(|err| StructuralError::Serialization(err.to_string()))
    }

    /// Serializes the full tree as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, StructuralError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| StructuralError::Serialization(err.to_string()))
    }

    /// Identifier used as the storage key.
    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    /// Synthetic root node.
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Top-level field definitions.
    pub fn fields(&self) -> &[SchemaNode] {
        self.root.children()
    }

    /// Finds a top-level field by name.
    pub fn field(&self, name: &str) -> Option<&SchemaNode> {
        self.root.child(name)
    }

    /// Number of top-level fields.
    pub fn field_count(&self) -> usize {
        self.root.children().len()
    }
}

/// Checks one sibling set and, recursively, every set below it.
///
/// Children of non-object fields are checked too: uniqueness holds under
/// any parent even where the children are never validated against.
fn check_fields(fields: &[SchemaNode], path: &str) -> Result<(), StructuralError> {
    let mut seen: HashSet<&str> = HashSet::new();

    for (i, field) in fields.iter().enumerate() {
        let field_path = format!("{path}[{i}]");

        if field.name().is_empty() {
            return Err(StructuralError::EmptyName { path: field_path });
        }
        if field.is_ignored() {
            return Err(StructuralError::MisplacedIgnore { path: field_path });
        }
        if !seen.insert(field.name()) {
            return Err(StructuralError::DuplicateName {
                path: path.to_string(),
                name: field.name().to_string(),
            });
        }

        check_fields(field.children(), &format!("{field_path}.children"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::FieldType;

    #[test]
    fn test_build_wraps_fields_under_ignored_root() {
        let tree = SchemaTree::build(
            "asd",
            &json!([
                {"name": "abc", "type": "string"},
                {"name": "ab", "type": "string"},
            ]),
        )
        .unwrap();

        assert!(tree.root().is_ignored());
        assert_eq!(tree.field_count(), 2);
        assert_eq!(tree.fields()[0].name(), "abc");
        assert_eq!(tree.field("ab").unwrap().field_type(), FieldType::String);
    }

    #[test]
    fn test_build_accepts_empty_body() {
        let tree = SchemaTree::build("empty", &json!([])).unwrap();
        assert_eq!(tree.field_count(), 0);
    }

    #[test]
    fn test_build_rejects_missing_id_and_bad_body() {
        assert_eq!(
            SchemaTree::build("", &json!([])),
            Err(StructuralError::MissingSchemaId)
        );
        assert_eq!(
            SchemaTree::build("s", &json!({"name": "a", "type": "string"})),
            Err(StructuralError::BodyNotASequence)
        );
    }

    #[test]
    fn test_from_definition_requires_both_keys() {
        assert_eq!(
            SchemaTree::from_definition(&json!({"schema_body": []})),
            Err(StructuralError::MissingSchemaId)
        );
        assert_eq!(
            SchemaTree::from_definition(&json!({"schema_id": 4, "schema_body": []})),
            Err(StructuralError::MissingSchemaId)
        );
        assert_eq!(
            SchemaTree::from_definition(&json!({"schema_id": "s"})),
            Err(StructuralError::BodyNotASequence)
        );
    }

    #[test]
    fn test_invalid_definition_rejects_tree() {
        let err = SchemaTree::build(
            "s",
            &json!([
                {"name": "a", "type": "string"},
                {"name": "b"},
            ]),
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("schema_body[1]"));
    }

    #[test]
    fn test_duplicate_top_level_names() {
        let err = SchemaTree::build(
            "s",
            &json!([
                {"name": "x", "type": "string"},
                {"name": "x", "type": "number"},
            ]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            StructuralError::DuplicateName {
                path: "schema_body".to_string(),
                name: "x".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_nested_names_reject_whole_tree() {
        let err = SchemaTree::build(
            "s",
            &json!([
                {"name": "fine", "type": "number"},
                {
                    "name": "outer",
                    "type": "object",
                    "children": [
                        {
                            "name": "inner",
                            "type": "object",
                            "children": [
                                {"name": "leaf", "type": "string"},
                                {"name": "leaf", "type": "boolean"},
                            ],
                        },
                    ],
                },
            ]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            StructuralError::DuplicateName {
                path: "schema_body[1].children[0].children".to_string(),
                name: "leaf".to_string(),
            }
        );
    }

    #[test]
    fn test_same_name_at_different_levels_is_allowed() {
        let tree = SchemaTree::build(
            "s",
            &json!([
                {
                    "name": "f1",
                    "type": "object",
                    "children": [
                        {"name": "f1", "type": "object", "children": [{"name": "f1", "type": "object"}]},
                        {"name": "f2", "type": "number"},
                    ],
                },
            ]),
        );
        assert!(tree.is_ok());
    }

    #[test]
    fn test_from_nodes_checks_structure() {
        let dup = SchemaNode::new("o", FieldType::Object)
            .with_child(SchemaNode::new("k", FieldType::String))
            .with_child(SchemaNode::new("k", FieldType::String));
        assert!(matches!(
            SchemaTree::from_nodes("s", vec![dup]),
            Err(StructuralError::DuplicateName { .. })
        ));
        assert!(matches!(
            SchemaTree::from_nodes("s", vec![SchemaNode::new("", FieldType::String)]),
            Err(StructuralError::EmptyName { .. })
        ));
    }

    #[test]
    fn test_json_round_trip_preserves_tree() {
        let tree = SchemaTree::build(
            "s",
            &json!([
                {"name": "a", "type": "string", "optional": true},
                {"name": "b", "type": "number", "is_array": true},
                {"name": "c", "type": "object", "children": [{"name": "d", "type": "boolean"}]},
            ]),
        )
        .unwrap();

        let restored = SchemaTree::from_json(&tree.to_json().unwrap()).unwrap();
        assert_eq!(restored, tree);
        assert!(restored.root().is_ignored());

        let pretty = SchemaTree::from_json(&tree.to_json_pretty().unwrap()).unwrap();
        assert_eq!(pretty, tree);
    }

    #[test]
    fn test_persisted_form_includes_root() {
        let tree = SchemaTree::build("s", &json!([{"name": "a", "type": "string"}])).unwrap();
        let value: Value = serde_json::from_str(&tree.to_json().unwrap()).unwrap();
        assert_eq!(value["schema_id"], "s");
        assert_eq!(value["root"]["ignore"], true);
        assert_eq!(value["root"]["children"][0]["name"], "a");
        assert!(value["root"]["children"][0].get("ignore").is_none());
    }

    #[test]
    fn test_from_json_rejects_tampered_payloads() {
        let missing_ignore = json!({
            "schema_id": "s",
            "root": {"name": "", "type": "object", "children": []},
        });
        assert_eq!(
            SchemaTree::from_json(&missing_ignore.to_string()),
            Err(StructuralError::MisplacedIgnore {
                path: "root".to_string(),
            })
        );

        let duplicate = json!({
            "schema_id": "s",
            "root": {
                "name": "",
                "type": "object",
                "ignore": true,
                "children": [
                    {"name": "x", "type": "string"},
                    {"name": "x", "type": "string"},
                ],
            },
        });
        assert_eq!(
            SchemaTree::from_json(&duplicate.to_string()),
            Err(StructuralError::DuplicateName {
                path: "schema_body".to_string(),
                name: "x".to_string(),
            })
        );

        let nested_ignore = json!({
            "schema_id": "s",
            "root": {
                "name": "",
                "type": "object",
                "ignore": true,
                "children": [{"name": "x", "type": "string", "ignore": true}],
            },
        });
        assert!(SchemaTree::from_json(&nested_ignore.to_string()).is_err());

        assert!(matches!(
            SchemaTree::from_json("not json"),
            Err(StructuralError::Serialization(_))
        ));
    }
}
