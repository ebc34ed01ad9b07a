//! SQLite storage backend for config schemas.
//!
//! This crate stores serialized schema trees and configuration documents in
//! two prefixed SQLite tables and exposes them through the
//! [`KeyValueStore`](config_schema_db::KeyValueStore) contract, so a
//! [`SchemaRegistry`](config_schema_db::SchemaRegistry) can run on top of
//! a database file.
//!
//! # Architecture
//!
//! - **`schema`** — SQL generation with customizable table prefixes
//! - **`migration`** — Lifecycle operations (up/down/seed/refresh/status)
//! - **`store`** — Per-key reads and writes
//!
//! # Quick start
//!
//! ```no_run
//! use config_schema_db::SchemaRegistry;
//! use config_schema_sqlite::{Migration, SqliteStore};
//! use rusqlite::Connection;
//! use serde_json::json;
//!
//! let conn = Connection::open("config-schema.db").unwrap();
//! let mut migration = Migration::new(conn, "cs_").unwrap();
//! migration.up().unwrap();
//! let conn = migration.into_connection();
//!
//! let registry = SchemaRegistry::new(SqliteStore::new(&conn, "cs_").unwrap());
//! registry
//!     .register_schema(&json!({
//!         "schema_id": "service",
//!         "schema_body": [{"name": "port", "type": "number"}],
//!     }))
//!     .unwrap();
//! assert!(registry.validate_document("service", &json!({"port": 80})).unwrap());
//! ```
//!
//! # Table prefix customization
//!
//! Table names are prefixed with a configurable string, allowing multiple
//! isolated registries within the same SQLite database. Prefixes must
//! contain only alphanumeric characters and underscores.

mod error;
mod migration;
mod schema;
mod store;

pub use error::{Result, SqliteError};
pub use migration::{Migration, MigrationStatus, SeedReport};
pub use schema::{generate_drop_sql, generate_schema_sql};
pub use store::SqliteStore;
