//! Migration lifecycle operations for the SQLite record tables.
//!
//! Provides [`Migration`] for creating, dropping, seeding, and refreshing
//! the schema and config tables. All mutation operations use transactions
//! to ensure atomicity.
//!
//! # Example
//!
//! ```no_run
//! use config_schema_sqlite::Migration;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("config-schema.db").unwrap();
//! let mut migration = Migration::new(conn, "cs_").unwrap();
//!
//! migration.up().unwrap();
//! assert!(migration.status().unwrap().tables_exist);
//!
//! // Register every definition file in a directory
//! migration.seed("schemas/").unwrap();
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config_schema_core::SchemaTree;
use config_schema_db::Namespace;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, SqliteError};
use crate::schema::{generate_drop_sql, generate_schema_sql, table_suffix, validate_prefix};
use crate::store::upsert_sql;

/// Manages the lifecycle of the record tables.
///
/// Tables are created with [`up`](Self::up), dropped with
/// [`down`](Self::down), and populated from definition files with
/// [`seed`](Self::seed).
pub struct Migration {
    conn: Connection,
    prefix: String,
}

impl Migration {
    /// Creates a new migration manager for the given connection and table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] if the prefix contains invalid characters.
    pub fn new(conn: Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self { conn, prefix })
    }

    /// Creates the record tables.
    ///
    /// Safe to call repeatedly.
    pub fn up(&mut self) -> Result<()> {
        let sql = generate_schema_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to create tables: {e}")))?;
        tx.commit()?;
        debug!(prefix = %self.prefix, "record tables ready");
        Ok(())
    }

    /// Drops the record tables and everything stored in them.
    pub fn down(&mut self) -> Result<()> {
        let sql = generate_drop_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to drop tables: {e}")))?;
        tx.commit()?;
        info!(prefix = %self.prefix, "record tables dropped");
        Ok(())
    }

    /// Returns whether the tables exist and how many records each holds.
    pub fn status(&self) -> Result<MigrationStatus> {
        if !self.tables_exist()? {
            return Ok(MigrationStatus::default());
        }

        Ok(MigrationStatus {
            tables_exist: true,
            schema_count: self.count_rows(Namespace::Schema)?,
            config_count: self.count_rows(Namespace::Config)?,
        })
    }

    /// Stores every `*.json` schema definition found in `source_dir`.
    ///
    /// Files are processed in name order inside one transaction. A schema
    /// whose id is already stored is replaced. If any file is unreadable,
    /// does not describe a valid schema, or repeats a `schema_id` seen in
    /// another file of the same directory, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::MigrationError`] naming the offending file(s),
    /// or [`SqliteError::DatabaseError`] if insertion fails.
    pub fn seed(&mut self, source_dir: impl AsRef<Path>) -> Result<SeedReport> {
        let files = definition_files(source_dir.as_ref())?;
        let trees = files
            .iter()
            .map(|path| load_definition(path))
            .collect::<Result<Vec<_>>>()?;
        reject_duplicate_ids(&files, &trees)?;

        let sql = upsert_sql(&self.prefix, Namespace::Schema);
        let tx = self.conn.transaction()?;
        let mut report = SeedReport::default();
        {
            let mut stmt = tx.prepare(&sql)?;
            for tree in &trees {
                let body = tree
                    .to_json()
                    .map_err(|e| SqliteError::MigrationError(e.to_string()))?;
                stmt.execute([tree.schema_id(), body.as_str()])?;
                report.schemas_inserted += 1;
            }
        }
        tx.commit()?;

        info!(count = report.schemas_inserted, "seeded schemas");
        Ok(report)
    }

    /// Drops all tables, recreates them, and seeds from the given directory.
    pub fn refresh(&mut self, source_dir: impl AsRef<Path>) -> Result<SeedReport> {
        self.down()?;
        self.up()?;
        self.seed(source_dir)
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the migration and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn tables_exist(&self) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1")?;
        for namespace in Namespace::ALL {
            let table_name = format!("{}{}", self.prefix, table_suffix(namespace));
            let count: i64 = stmt.query_row([&table_name], |row| row.get(0))?;
            if count == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn count_rows(&self, namespace: Namespace) -> Result<usize> {
        let full_table = format!("{}{}", self.prefix, table_suffix(namespace));
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {full_table}"), [], |row| {
                    row.get(0)
                })?;
        Ok(count as usize)
    }
}

fn definition_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        SqliteError::MigrationError(format!("cannot read {}: {e}", dir.display()))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| SqliteError::MigrationError(format!("cannot read {}: {e}", dir.display())))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn reject_duplicate_ids(files: &[PathBuf], trees: &[SchemaTree]) -> Result<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for (path, tree) in files.iter().zip(trees) {
        if let Some(first) = seen.insert(tree.schema_id(), path) {
            return Err(SqliteError::MigrationError(format!(
                "schema_id '{}' defined in both {} and {}",
                tree.schema_id(),
                first.display(),
                path.display()
            )));
        }
    }
    Ok(())
}

fn load_definition(path: &Path) -> Result<SchemaTree> {
    let fail = |reason: String| SqliteError::MigrationError(format!("{}: {reason}", path.display()));

    let text = std::fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
    let definition: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| fail(e.to_string()))?;
    let tree = SchemaTree::from_definition(&definition).map_err(|e| fail(e.to_string()))?;
    debug!(file = %path.display(), schema_id = tree.schema_id(), "loaded definition");
    Ok(tree)
}

/// Snapshot returned by [`Migration::status`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Whether both record tables exist.
    pub tables_exist: bool,
    /// Number of stored schemas.
    pub schema_count: usize,
    /// Number of stored configuration documents.
    pub config_count: usize,
}

/// Result of [`Migration::seed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Number of schemas written.
    pub schemas_inserted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_definition(dir: &Path, file: &str, body: &str) {
        std::fs::write(dir.join(file), body).unwrap();
    }

    #[test]
    fn test_migration_new_validates_prefix() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(Migration::new(conn, "valid_prefix_").is_ok());

        let conn = Connection::open_in_memory().unwrap();
        assert!(Migration::new(conn, "").is_err());

        let conn = Connection::open_in_memory().unwrap();
        assert!(Migration::new(conn, "drop;--").is_err());
    }

    #[test]
    fn test_status_on_empty_database() {
        let conn = Connection::open_in_memory().unwrap();
        let migration = Migration::new(conn, "cs_").unwrap();
        assert_eq!(migration.status().unwrap(), MigrationStatus::default());
    }

    #[test]
    fn test_up_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "cs_").unwrap();
        migration.up().unwrap();
        migration.up().unwrap();

        let status = migration.status().unwrap();
        assert!(status.tables_exist);
        assert_eq!(status.schema_count, 0);
        assert_eq!(status.config_count, 0);
    }

    #[test]
    fn test_down_removes_tables() {
        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "cs_").unwrap();
        migration.up().unwrap();
        migration.down().unwrap();
        assert!(!migration.status().unwrap().tables_exist);

        migration.down().unwrap();
    }

    #[test]
    fn test_seed_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_definition(
            dir.path(),
            "a.json",
            r#"{"schema_id": "a", "schema_body": [{"name": "x", "type": "string"}]}"#,
        );
        write_definition(dir.path(), "b.json", r#"{"schema_id": "b", "schema_body": []}"#);
        write_definition(dir.path(), "notes.txt", "not a definition");

        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "cs_").unwrap();
        migration.up().unwrap();

        let report = migration.seed(dir.path()).unwrap();
        assert_eq!(report.schemas_inserted, 2);
        assert_eq!(migration.status().unwrap().schema_count, 2);

        // Seeding again replaces rather than duplicates.
        migration.seed(dir.path()).unwrap();
        assert_eq!(migration.status().unwrap().schema_count, 2);
    }

    #[test]
    fn test_seed_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_definition(dir.path(), "a.json", r#"{"schema_id": "a", "schema_body": []}"#);
        write_definition(
            dir.path(),
            "b.json",
            r#"{"schema_id": "b", "schema_body": [{"name": "x", "type": "date"}]}"#,
        );

        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "cs_").unwrap();
        migration.up().unwrap();

        let err = migration.seed(dir.path()).unwrap_err();
        assert!(err.to_string().contains("b.json"));
        assert_eq!(migration.status().unwrap().schema_count, 0);
    }

    #[test]
    fn test_seed_rejects_repeated_schema_id() {
        let dir = tempfile::tempdir().unwrap();
        write_definition(dir.path(), "a.json", r#"{"schema_id": "svc", "schema_body": []}"#);
        write_definition(
            dir.path(),
            "b.json",
            r#"{"schema_id": "svc", "schema_body": [{"name": "x", "type": "string"}]}"#,
        );
        write_definition(dir.path(), "c.json", r#"{"schema_id": "other", "schema_body": []}"#);

        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "cs_").unwrap();
        migration.up().unwrap();

        let err = migration.seed(dir.path()).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, SqliteError::MigrationError(_)));
        assert!(message.contains("'svc'"));
        assert!(message.contains("a.json"));
        assert!(message.contains("b.json"));
        assert_eq!(migration.status().unwrap().schema_count, 0);
    }

    #[test]
    fn test_refresh_clears_configs() {
        let dir = tempfile::tempdir().unwrap();
        write_definition(dir.path(), "a.json", r#"{"schema_id": "a", "schema_body": []}"#);

        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "cs_").unwrap();
        migration.up().unwrap();
        migration
            .connection()
            .execute("INSERT INTO cs_configs (id, body) VALUES ('c', '{}')", [])
            .unwrap();

        migration.refresh(dir.path()).unwrap();
        let status = migration.status().unwrap();
        assert_eq!(status.schema_count, 1);
        assert_eq!(status.config_count, 0);
    }
}
