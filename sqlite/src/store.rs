//! [`KeyValueStore`] implementation over the prefixed record tables.
//!
//! [`SqliteStore`] borrows a [`Connection`] whose tables were created by
//! [`Migration::up`](crate::Migration::up), and maps each namespace to its
//! own table.

use config_schema_db::{KeyValueStore, Namespace};
use rusqlite::{Connection, OptionalExtension};
use tracing::trace;

use crate::error::Result;
use crate::schema::{table_suffix, validate_prefix};

/// Statement that inserts a record or replaces the body of an existing one.
pub(crate) fn upsert_sql(prefix: &str, namespace: Namespace) -> String {
    let table = table_suffix(namespace);
    format!(
        "INSERT INTO {prefix}{table} (id, body) VALUES (?1, ?2) \
         ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = datetime('now')"
    )
}

/// Key-value store backed by SQLite.
///
/// # Examples
///
/// ```no_run
/// use config_schema_db::SchemaRegistry;
/// use config_schema_sqlite::{Migration, SqliteStore};
/// use rusqlite::Connection;
///
/// let conn = Connection::open("config-schema.db").unwrap();
/// let mut migration = Migration::new(conn, "cs_").unwrap();
/// migration.up().unwrap();
/// let conn = migration.into_connection();
///
/// let registry = SchemaRegistry::new(SqliteStore::new(&conn, "cs_").unwrap());
/// let schema = registry.get_schema("service").unwrap();
/// ```
#[derive(Debug)]
pub struct SqliteStore<'a> {
    conn: &'a Connection,
    prefix: String,
}

impl<'a> SqliteStore<'a> {
    /// Creates a store over `conn` using tables named with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`](crate::SqliteError::InvalidPrefix)
    /// if the prefix contains invalid characters.
    pub fn new(conn: &'a Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { conn, prefix })
    }

    /// Ids stored in `namespace`, in ascending order.
    pub fn keys(&self, namespace: Namespace) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id FROM {} ORDER BY id", self.table(namespace)))?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let keys = rows.collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn table(&self, namespace: Namespace) -> String {
        format!("{}{}", self.prefix, table_suffix(namespace))
    }

    fn upsert(&self, namespace: Namespace, key: &str, value: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute(&upsert_sql(&self.prefix, namespace), [key, value])?;
        trace!(%namespace, key, changed, "upsert");
        Ok(changed > 0)
    }

    fn select(&self, namespace: Namespace, key: &str) -> Result<Option<String>> {
        let sql = format!("SELECT body FROM {} WHERE id = ?1", self.table(namespace));
        let body = self
            .conn
            .query_row(&sql, [key], |row| row.get(0))
            .optional()?;
        Ok(body)
    }

    fn remove(&self, namespace: Namespace, key: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.table(namespace));
        let removed = self.conn.execute(&sql, [key])?;
        Ok(removed > 0)
    }

    fn contains(&self, namespace: Namespace, key: &str) -> Result<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)",
            self.table(namespace)
        );
        let found: bool = self.conn.query_row(&sql, [key], |row| row.get(0))?;
        Ok(found)
    }
}

impl KeyValueStore for SqliteStore<'_> {
    fn set(&self, namespace: Namespace, key: &str, value: &str) -> config_schema_db::Result<bool> {
        Ok(self.upsert(namespace, key, value)?)
    }

    fn get(&self, namespace: Namespace, key: &str) -> config_schema_db::Result<Option<String>> {
        Ok(self.select(namespace, key)?)
    }

    fn delete(&self, namespace: Namespace, key: &str) -> config_schema_db::Result<bool> {
        Ok(self.remove(namespace, key)?)
    }

    fn exists(&self, namespace: Namespace, key: &str) -> config_schema_db::Result<bool> {
        Ok(self.contains(namespace, key)?)
    }
}
