//! Storage contract, registry service, and configuration for config schemas.
//!
//! This crate sits between the pure schema core and concrete storage
//! backends:
//!
//! - [`KeyValueStore`] — the persistence contract (`set`, `get`, `delete`,
//!   `exists`) keyed by [`Namespace`] and id.
//! - [`MemoryStore`] — an in-process backend.
//! - [`SchemaRegistry`] — registers, replaces, loads, and deletes schemas
//!   and configuration documents, and validates documents against stored
//!   schemas.
//! - [`RegistryConfig`] — YAML settings for a registry process.
//!
//! # Quick start
//!
//! ```
//! use config_schema_db::{MemoryStore, Outcome, SchemaRegistry};
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::new(MemoryStore::new());
//! registry
//!     .register_schema(&json!({
//!         "schema_id": "app",
//!         "schema_body": [
//!             {"name": "debug", "type": "boolean", "optional": true},
//!             {"name": "hosts", "type": "string", "is_array": true},
//!         ],
//!     }))
//!     .unwrap();
//!
//! registry.set_config("prod", &json!({"hosts": ["a", "b"]})).unwrap();
//! let report = registry.validate_stored_config("app", "prod").unwrap();
//! assert!(report.is_valid());
//! ```

mod config;
mod error;
mod registry;
mod store;

pub use config::{DEFAULT_DB_PATH, DEFAULT_LOG_LEVEL, DEFAULT_PREFIX, RegistryConfig, StorageConfig};
pub use error::{DatabaseError, Result};
pub use registry::{Outcome, SchemaRegistry};
pub use store::{KeyValueStore, MemoryStore, Namespace};
