//! Structural errors raised while building schema nodes and trees.
//!
//! A raw definition that fails any required-key, key-type, or
//! sibling-uniqueness check produces a [`StructuralError`] instead of a
//! node. Every variant that concerns a single definition carries the path
//! of that definition (for example `schema_body[1].children[0]`) so the
//! caller can report where the schema went wrong.

use thiserror::Error;

/// Reasons a schema definition is rejected.
///
/// Construction stops at the first defect found; the error describes that
/// defect only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// The definition is not a JSON object.
    #[error("field definition at {path} must be a mapping")]
    NotAMapping { path: String },

    /// A required key (`name` or `type`) is absent.
    #[error("field definition at {path} is missing required key '{key}'")]
    MissingKey { path: String, key: &'static str },

    /// A key is present but holds the wrong JSON kind.
    #[error("key '{key}' at {path} must be a {expected}")]
    WrongKeyType {
        path: String,
        key: &'static str,
        expected: &'static str,
    },

    /// The `name` key is an empty string.
    #[error("field name at {path} cannot be empty")]
    EmptyName { path: String },

    /// The `type` key names something outside the primitive set.
    #[error(
        "unknown field type '{found}' at {path}: expected one of string, number, boolean, object"
    )]
    UnknownType { path: String, found: String },

    /// Two siblings under the same parent share a name.
    #[error("duplicate field name '{name}' in {path}")]
    DuplicateName { path: String, name: String },

    /// `schema_id` is absent, not a string, or empty.
    #[error("schema_id must be a non-empty string")]
    MissingSchemaId,

    /// `schema_body` is absent or not an array.
    #[error("schema_body must be a sequence of field definitions")]
    BodyNotASequence,

    /// A persisted tree has the ignore marker on a field, or lacks it on the root.
    #[error("ignore marker misplaced at {path}")]
    MisplacedIgnore { path: String },

    /// Persisted schema text is not valid JSON for a schema tree.
    #[error("persisted schema is malformed: {0}")]
    Serialization(String),
}

impl StructuralError {
    /// Returns the definition path the error refers to, if it has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NotAMapping { path }
            | Self::MissingKey { path, .. }
            | Self::WrongKeyType { path, .. }
            | Self::EmptyName { path }
            | Self::UnknownType { path, .. }
            | Self::DuplicateName { path, .. }
            | Self::MisplacedIgnore { path } => Some(path),
            Self::MissingSchemaId | Self::BodyNotASequence | Self::Serialization(_) => None,
        }
    }
}
