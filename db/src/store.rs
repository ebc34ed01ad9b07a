//! Key-value storage contract and the in-memory backend.
//!
//! Schemas and configuration documents are persisted as JSON text under
//! their ids. [`KeyValueStore`] is the whole contract a backend has to
//! meet; [`MemoryStore`] implements it over a `HashMap` and the
//! `config-schema-sqlite` crate implements it over SQLite tables.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{DatabaseError, Result};

/// Separates schema ids from configuration ids.
///
/// The same key may exist in both namespaces without conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Serialized schema trees, keyed by `schema_id`.
    Schema,
    /// Configuration documents, keyed by `config_id`.
    Config,
}

impl Namespace {
    /// Both namespaces, in storage order.
    pub const ALL: [Namespace; 2] = [Namespace::Schema, Namespace::Config];

    /// Lowercase name used in storage and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Schema => "schema",
            Namespace::Config => "config",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistence contract for schema and configuration text.
///
/// Each operation is assumed atomic per key. Implementations take `&self`
/// so a store can be shared behind a registry; backends with mutable
/// state use interior locking.
pub trait KeyValueStore {
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// Returns `false` if the backend accepted the call but did not write.
    fn set(&self, namespace: Namespace, key: &str, value: &str) -> Result<bool>;

    /// Returns the value under `key`, or `None` if absent.
    fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>>;

    /// Removes `key`. Returns `false` if it was absent.
    fn delete(&self, namespace: Namespace, key: &str) -> Result<bool>;

    /// Returns whether `key` is present.
    fn exists(&self, namespace: Namespace, key: &str) -> Result<bool>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn set(&self, namespace: Namespace, key: &str, value: &str) -> Result<bool> {
        (**self).set(namespace, key, value)
    }

    fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>> {
        (**self).get(namespace, key)
    }

    fn delete(&self, namespace: Namespace, key: &str) -> Result<bool> {
        (**self).delete(namespace, key)
    }

    fn exists(&self, namespace: Namespace, key: &str) -> Result<bool> {
        (**self).exists(namespace, key)
    }
}

/// In-memory store, mainly for tests and one-shot validation.
///
/// # Examples
///
/// ```
/// use config_schema_db::{KeyValueStore, MemoryStore, Namespace};
///
/// let store = MemoryStore::new();
/// assert!(store.set(Namespace::Config, "app", "{}").unwrap());
/// assert_eq!(store.get(Namespace::Config, "app").unwrap().as_deref(), Some("{}"));
/// assert!(!store.exists(Namespace::Schema, "app").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(Namespace, String), String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries in `namespace`.
    pub fn len(&self, namespace: Namespace) -> Result<usize> {
        let entries = self.lock()?;
        Ok(entries.keys().filter(|(ns, _)| *ns == namespace).count())
    }

    /// Returns `true` if no entries are stored in any namespace.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(Namespace, String), String>>> {
        self.entries
            .lock()
            .map_err(|_| DatabaseError::Backend("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn set(&self, namespace: Namespace, key: &str, value: &str) -> Result<bool> {
        self.lock()?
            .insert((namespace, key.to_string()), value.to_string());
        Ok(true)
    }

    fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(&(namespace, key.to_string())).cloned())
    }

    fn delete(&self, namespace: Namespace, key: &str) -> Result<bool> {
        Ok(self.lock()?.remove(&(namespace, key.to_string())).is_some())
    }

    fn exists(&self, namespace: Namespace, key: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(&(namespace, key.to_string())))
    }
}
