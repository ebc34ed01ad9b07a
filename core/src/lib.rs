//! Schema trees and structural validation for JSON configuration documents.
//!
//! A client registers a named schema, a list of field definitions, and
//! later checks configuration documents against it:
//!
//! - [`SchemaNode`] — one field definition (name, [`FieldType`],
//!   optional/array flags, nested fields), parsed by [`parse_node`].
//! - [`SchemaTree`] — a named set of top-level fields under a synthetic
//!   root, rejected as a whole if any definition is malformed or any two
//!   siblings share a name. Serializes to and from the persisted JSON form.
//! - [`validate_config`] — pass/fail check of a document against a tree.
//! - [`explain_config`] — the same check, returning a [`ValidationReport`]
//!   that lists every [`Violation`] with its document path.
//!
//! The crate performs no I/O and does not log.
//!
//! # Example
//!
//! ```
//! use config_schema_core::*;
//! use serde_json::json;
//!
//! let tree = SchemaTree::from_definition(&json!({
//!     "schema_id": "service",
//!     "schema_body": [
//!         {"name": "name", "type": "string"},
//!         {"name": "replicas", "type": "number", "optional": true},
//!         {"name": "ports", "type": "number", "is_array": true},
//!         {"name": "tls", "type": "object", "optional": true, "children": [
//!             {"name": "cert", "type": "string"},
//!         ]},
//!     ],
//! }))
//! .unwrap();
//!
//! assert!(validate_config(&tree, &json!({"name": "api", "ports": [80, 443]})));
//! assert!(!validate_config(&tree, &json!({"name": "api", "ports": [80], "tls": {}})));
//!
//! // Duplicate sibling names reject the whole schema.
//! let dup = SchemaTree::build("s", &json!([
//!     {"name": "x", "type": "string"},
//!     {"name": "x", "type": "number"},
//! ]));
//! assert!(matches!(dup, Err(StructuralError::DuplicateName { .. })));
//! ```

mod error;
mod node;
mod tree;
mod validate;

pub use error::StructuralError;
pub use node::{FieldType, SchemaNode, parse_node};
pub use tree::SchemaTree;
pub use validate::{ValidationReport, Violation, ViolationKind, explain_config, validate_config};
