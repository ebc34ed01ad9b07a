//! Schema and configuration registry.
//!
//! [`SchemaRegistry`] is the request layer over a [`KeyValueStore`]:
//! it registers, replaces, loads, and deletes schemas and configuration
//! documents, and validates documents against stored schemas.
//!
//! Schemas are stored in their persisted tree form and reloaded through
//! [`SchemaTree::from_json`], so validation always runs against what was
//! stored, never against the caller's original definition.
//!
//! # Example
//!
//! ```
//! use config_schema_db::{MemoryStore, Outcome, SchemaRegistry};
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::new(MemoryStore::new());
//!
//! let outcome = registry
//!     .register_schema(&json!({
//!         "schema_id": "service",
//!         "schema_body": [{"name": "port", "type": "number"}],
//!     }))
//!     .unwrap();
//! assert!(outcome.is_success());
//!
//! assert!(registry.validate_document("service", &json!({"port": 8080})).unwrap());
//! assert!(!registry.validate_document("service", &json!({"port": "8080"})).unwrap());
//! ```

use std::fmt;

use config_schema_core::{
    SchemaTree, StructuralError, ValidationReport, explain_config, validate_config,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{DatabaseError, Result};
use crate::store::{KeyValueStore, Namespace};

/// Result of a registry write.
///
/// Rejections that stem from the request itself (duplicate id, unknown id,
/// malformed schema) are outcomes, not errors; storage failures are
/// reported as [`DatabaseError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new record was stored.
    Created(Namespace),
    /// An existing record was replaced.
    Updated(Namespace),
    /// A record was removed.
    Deleted(Namespace),
    /// A record with this id is already stored.
    AlreadyExists(Namespace),
    /// No record with this id is stored.
    NotFound(Namespace),
    /// The schema definition does not form a valid tree.
    InvalidSchema(StructuralError),
}

impl Outcome {
    /// Whether the write took effect.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::Created(_) | Outcome::Updated(_) | Outcome::Deleted(_)
        )
    }

    /// User-facing message for this outcome.
    pub fn message(&self) -> &'static str {
        use Namespace::{Config, Schema};
        match self {
            Outcome::Created(Schema) => "Schema successfully set.",
            Outcome::Created(Config) => "Configuration successfully set.",
            Outcome::Updated(Schema) => "Schema successfully updated.",
            Outcome::Updated(Config) => "Configuration successfully updated.",
            Outcome::Deleted(Schema) => "Schema successfully deleted.",
            Outcome::Deleted(Config) => "Configuration successfully deleted.",
            Outcome::AlreadyExists(Schema) => "Schema already set.",
            Outcome::AlreadyExists(Config) => "Configuration already set.",
            Outcome::NotFound(Schema) => "Schema with that id does not exist.",
            Outcome::NotFound(Config) => "Configuration with that id does not exist.",
            Outcome::InvalidSchema(_) => "Invalid schema format.",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::InvalidSchema(err) => write!(f, "{} ({err})", self.message()),
            _ => f.write_str(self.message()),
        }
    }
}

/// Registry of schemas and configuration documents over a key-value store.
pub struct SchemaRegistry<S> {
    store: S,
}

impl<S: KeyValueStore> SchemaRegistry<S> {
    /// Creates a registry over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the registry and returns the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Registers a schema from a `{schema_id, schema_body}` definition.
    ///
    /// An id that is already stored is rejected before the definition is
    /// parsed; re-registration never overwrites.
    pub fn register_schema(&self, definition: &Value) -> Result<Outcome> {
        if let Some(schema_id) = definition.get("schema_id").and_then(Value::as_str) {
            if self.store.exists(Namespace::Schema, schema_id)? {
                debug!(schema_id, "Schema already registered");
                return Ok(Outcome::AlreadyExists(Namespace::Schema));
            }
        }

        let tree = match SchemaTree::from_definition(definition) {
            Ok(tree) => tree,
            Err(err) => {
                debug!(error = %err, "Rejected schema definition");
                return Ok(Outcome::InvalidSchema(err));
            }
        };

        self.write_tree(&tree)?;
        info!(schema_id = tree.schema_id(), fields = tree.field_count(), "Registered schema");
        Ok(Outcome::Created(Namespace::Schema))
    }

    /// Replaces a stored schema wholesale.
    ///
    /// The id must already be stored; nothing is merged with the previous
    /// tree.
    pub fn update_schema(&self, definition: &Value) -> Result<Outcome> {
        let known = match definition.get("schema_id").and_then(Value::as_str) {
            Some(schema_id) => self.store.exists(Namespace::Schema, schema_id)?,
            None => false,
        };
        if !known {
            return Ok(Outcome::NotFound(Namespace::Schema));
        }

        let tree = match SchemaTree::from_definition(definition) {
            Ok(tree) => tree,
            Err(err) => {
                debug!(error = %err, "Rejected schema definition");
                return Ok(Outcome::InvalidSchema(err));
            }
        };

        self.write_tree(&tree)?;
        info!(schema_id = tree.schema_id(), fields = tree.field_count(), "Updated schema");
        Ok(Outcome::Updated(Namespace::Schema))
    }

    /// Loads a stored schema.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Structural`] if the stored text no longer
    /// forms a valid tree.
    pub fn get_schema(&self, schema_id: &str) -> Result<Option<SchemaTree>> {
        match self.store.get(Namespace::Schema, schema_id)? {
            Some(raw) => Ok(Some(SchemaTree::from_json(&raw)?)),
            None => Ok(None),
        }
    }

    /// Deletes a stored schema.
    pub fn delete_schema(&self, schema_id: &str) -> Result<Outcome> {
        if self.store.delete(Namespace::Schema, schema_id)? {
            info!(schema_id, "Deleted schema");
            Ok(Outcome::Deleted(Namespace::Schema))
        } else {
            Ok(Outcome::NotFound(Namespace::Schema))
        }
    }

    /// Stores a new configuration document.
    ///
    /// The document is not validated against any schema here.
    pub fn set_config(&self, config_id: &str, body: &Value) -> Result<Outcome> {
        if config_id.is_empty() {
            return Err(DatabaseError::EmptyKey(Namespace::Config));
        }
        if self.store.exists(Namespace::Config, config_id)? {
            debug!(config_id, "Configuration already stored");
            return Ok(Outcome::AlreadyExists(Namespace::Config));
        }

        self.write_config(config_id, body)?;
        info!(config_id, "Stored configuration");
        Ok(Outcome::Created(Namespace::Config))
    }

    /// Replaces a stored configuration document.
    pub fn update_config(&self, config_id: &str, body: &Value) -> Result<Outcome> {
        if !self.store.exists(Namespace::Config, config_id)? {
            return Ok(Outcome::NotFound(Namespace::Config));
        }

        self.write_config(config_id, body)?;
        info!(config_id, "Updated configuration");
        Ok(Outcome::Updated(Namespace::Config))
    }

    /// Loads a stored configuration document.
    pub fn get_config(&self, config_id: &str) -> Result<Option<Value>> {
        match self.store.get(Namespace::Config, config_id)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Deletes a stored configuration document.
    pub fn delete_config(&self, config_id: &str) -> Result<Outcome> {
        if self.store.delete(Namespace::Config, config_id)? {
            info!(config_id, "Deleted configuration");
            Ok(Outcome::Deleted(Namespace::Config))
        } else {
            Ok(Outcome::NotFound(Namespace::Config))
        }
    }

    /// Checks `document` against a stored schema.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::SchemaNotFound`] if the schema is not stored.
    pub fn validate_document(&self, schema_id: &str, document: &Value) -> Result<bool> {
        let tree = self.require_schema(schema_id)?;
        let valid = validate_config(&tree, document);
        debug!(schema_id, valid, "Validated document");
        Ok(valid)
    }

    /// Checks `document` against a stored schema and lists every violation.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::SchemaNotFound`] if the schema is not stored.
    pub fn explain_document(&self, schema_id: &str, document: &Value) -> Result<ValidationReport> {
        let tree = self.require_schema(schema_id)?;
        let report = explain_config(&tree, document);
        debug!(
            schema_id,
            violations = report.violations().len(),
            "Explained document"
        );
        Ok(report)
    }

    /// Checks a stored configuration document against a stored schema.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::SchemaNotFound`] or
    /// [`DatabaseError::ConfigNotFound`] when either record is missing.
    pub fn validate_stored_config(
        &self,
        schema_id: &str,
        config_id: &str,
    ) -> Result<ValidationReport> {
        let document = self
            .get_config(config_id)?
            .ok_or_else(|| DatabaseError::ConfigNotFound(config_id.to_string()))?;
        self.explain_document(schema_id, &document)
    }

    fn require_schema(&self, schema_id: &str) -> Result<SchemaTree> {
        self.get_schema(schema_id)?
            .ok_or_else(|| DatabaseError::SchemaNotFound(schema_id.to_string()))
    }

    fn write_tree(&self, tree: &SchemaTree) -> Result<()> {
        let payload = tree.to_json()?;
        if !self
            .store
            .set(Namespace::Schema, tree.schema_id(), &payload)?
        {
            warn!(schema_id = tree.schema_id(), "Store rejected schema write");
            return Err(DatabaseError::WriteRejected {
                namespace: Namespace::Schema,
                key: tree.schema_id().to_string(),
            });
        }
        Ok(())
    }

    fn write_config(&self, config_id: &str, body: &Value) -> Result<()> {
        let payload = serde_json::to_string(body)?;
        if !self.store.set(Namespace::Config, config_id, &payload)? {
            warn!(config_id, "Store rejected configuration write");
            return Err(DatabaseError::WriteRejected {
                namespace: Namespace::Config,
                key: config_id.to_string(),
            });
        }
        Ok(())
    }
}
