//! Structural validation of configuration documents.
//!
//! [`validate_config`] walks a [`SchemaTree`] and a JSON document in
//! lockstep and answers pass/fail. [`explain_config`] applies the same
//! rules without stopping early and returns every violation with its
//! document path.
//!
//! # Rules
//!
//! - The root is never type-checked; the document is matched against the
//!   top-level fields.
//! - An array field requires a JSON array whose every element has the
//!   declared type. Elements of an `object` array are only checked for
//!   being objects (or arrays); their children are not consulted.
//! - Any other field rejects arrays and requires the declared type.
//! - An `object` field's children are looked up by name. A missing
//!   required child fails validation; a missing optional child is
//!   skipped. A value that is not a JSON object has no entries.
//! - Document keys with no matching field are ignored.
//!
//! # Examples
//!
//! ```
//! use config_schema_core::{SchemaTree, validate_config};
//! use serde_json::json;
//!
//! let tree = SchemaTree::build("s", &json!([{"name": "a", "type": "string"}])).unwrap();
//!
//! assert!(validate_config(&tree, &json!({"a": "x"})));
//! assert!(!validate_config(&tree, &json!({})));
//! assert!(!validate_config(&tree, &json!({"a": 1})));
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::{FieldType, SchemaNode, SchemaTree};

/// How a node is checked against its document value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckMode {
    /// Root: skip the self check, match children only.
    Children,
    /// Array field: shallow element type check, children ignored.
    Array,
    /// Single value: type check, then children when the type is `object`.
    Scalar,
}

impl CheckMode {
    fn of(node: &SchemaNode) -> Self {
        if node.is_ignored() {
            CheckMode::Children
        } else if node.is_array() {
            CheckMode::Array
        } else {
            CheckMode::Scalar
        }
    }
}

/// Checks `document` against `tree`.
///
/// Returns `true` only if every declared field present in the document
/// has the declared shape and every required field is present. The first
/// missing required field ends the walk.
pub fn validate_config(tree: &SchemaTree, document: &Value) -> bool {
    check_node(tree.root(), document)
}

fn check_node(node: &SchemaNode, value: &Value) -> bool {
    match CheckMode::of(node) {
        CheckMode::Children => check_children(node, value),
        CheckMode::Array => match value {
            Value::Array(items) => items
                .iter()
                .all(|item| FieldType::of(item) == node.field_type()),
            _ => false,
        },
        CheckMode::Scalar => {
            if value.is_array() || FieldType::of(value) != node.field_type() {
                return false;
            }
            if node.field_type() == FieldType::Object {
                check_children(node, value)
            } else {
                true
            }
        }
    }
}

fn check_children(node: &SchemaNode, value: &Value) -> bool {
    let mut valid = true;
    for child in node.children() {
        match value.get(child.name()) {
            Some(child_value) => valid &= check_node(child, child_value),
            None if child.is_optional() => {}
            None => return false,
        }
    }
    valid
}

/// A single reason a document does not match its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// JSON Pointer to the offending value (or to where it was expected).
    pub path: String,
    /// What went wrong.
    #[serde(flatten)]
    pub kind: ViolationKind,
}

/// Categories of [`Violation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required field is absent.
    MissingField,
    /// A single value has the wrong type.
    TypeMismatch {
        expected: FieldType,
        found: &'static str,
    },
    /// An array field holds something other than an array.
    ExpectedArray { found: &'static str },
    /// A non-array field holds an array.
    UnexpectedArray { expected: FieldType },
    /// An element of an array field has the wrong type.
    ElementTypeMismatch {
        expected: FieldType,
        found: &'static str,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::MissingField => write!(f, "{}: required field is missing", self.path),
            ViolationKind::TypeMismatch { expected, found } => {
                write!(f, "{}: expected {expected}, found {found}", self.path)
            }
            ViolationKind::ExpectedArray { found } => {
                write!(f, "{}: expected an array, found {found}", self.path)
            }
            ViolationKind::UnexpectedArray { expected } => {
                write!(f, "{}: expected {expected}, found array", self.path)
            }
            ViolationKind::ElementTypeMismatch { expected, found } => {
                write!(f, "{}: expected array element of type {expected}, found {found}", self.path)
            }
        }
    }
}

/// Every violation found in one document.
///
/// `report.is_valid()` always agrees with [`validate_config`] for the
/// same inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    schema_id: String,
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// Identifier of the schema the document was checked against.
    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    /// Whether the document passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations in document order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes the report, returning its violations.
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

/// Checks `document` against `tree`, collecting every violation.
///
/// # Examples
///
/// ```
/// use config_schema_core::{SchemaTree, ViolationKind, explain_config};
/// use serde_json::json;
///
/// let tree = SchemaTree::build("s", &json!([
///     {"name": "name", "type": "string"},
///     {"name": "ports", "type": "number", "is_array": true},
/// ]))
/// .unwrap();
///
/// let report = explain_config(&tree, &json!({"ports": [80, "443"]}));
/// assert!(!report.is_valid());
/// assert_eq!(report.violations()[0].path, "/name");
/// assert_eq!(report.violations()[0].kind, ViolationKind::MissingField);
/// assert_eq!(report.violations()[1].path, "/ports/1");
/// ```
pub fn explain_config(tree: &SchemaTree, document: &Value) -> ValidationReport {
    let mut violations = Vec::new();
    collect_node(tree.root(), document, "", &mut violations);
    ValidationReport {
        schema_id: tree.schema_id().to_string(),
        violations,
    }
}

fn collect_node(node: &SchemaNode, value: &Value, path: &str, out: &mut Vec<Violation>) {
    match CheckMode::of(node) {
        CheckMode::Children => collect_children(node, value, path, out),
        CheckMode::Array => {
            let Value::Array(items) = value else {
                out.push(Violation {
                    path: path.to_string(),
                    kind: ViolationKind::ExpectedArray {
                        found: value_kind(value),
                    },
                });
                return;
            };
            for (i, item) in items.iter().enumerate() {
                if FieldType::of(item) != node.field_type() {
                    out.push(Violation {
                        path: format!("{path}/{i}"),
                        kind: ViolationKind::ElementTypeMismatch {
                            expected: node.field_type(),
                            found: value_kind(item),
                        },
                    });
                }
            }
        }
        CheckMode::Scalar => {
            if value.is_array() {
                out.push(Violation {
                    path: path.to_string(),
                    kind: ViolationKind::UnexpectedArray {
                        expected: node.field_type(),
                    },
                });
            } else if FieldType::of(value) != node.field_type() {
                out.push(Violation {
                    path: path.to_string(),
                    kind: ViolationKind::TypeMismatch {
                        expected: node.field_type(),
                        found: value_kind(value),
                    },
                });
            } else if node.field_type() == FieldType::Object {
                collect_children(node, value, path, out);
            }
        }
    }
}

fn collect_children(node: &SchemaNode, value: &Value, path: &str, out: &mut Vec<Violation>) {
    for child in node.children() {
        let child_path = format!("{path}/{}", escape_pointer(child.name()));
        match value.get(child.name()) {
            Some(child_value) => collect_node(child, child_value, &child_path, out),
            None if child.is_optional() => {}
            None => out.push(Violation {
                path: child_path,
                kind: ViolationKind::MissingField,
            }),
        }
    }
}

/// Escapes a field name as a JSON Pointer reference token (RFC 6901).
fn escape_pointer(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
