//! Error types for registry and storage operations.
//!
//! Provides a unified error type covering all failure modes: I/O,
//! serialization, malformed persisted schemas, missing records, and
//! backend failures.

use config_schema_core::StructuralError;
use thiserror::Error;

use crate::store::Namespace;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A persisted schema no longer forms a valid tree.
    #[error("stored schema is invalid: {0}")]
    Structural(#[from] StructuralError),

    /// Requested schema is not stored.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    /// Requested configuration is not stored.
    #[error("configuration not found: {0}")]
    ConfigNotFound(String),

    /// Keys must be non-empty.
    #[error("{0} id cannot be empty")]
    EmptyKey(Namespace),

    /// The backend reported that a write did not take effect.
    #[error("{namespace} '{key}' was not written")]
    WriteRejected { namespace: Namespace, key: String },

    /// Storage backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
