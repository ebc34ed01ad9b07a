//! SQL schema generation with customizable table prefixes.
//!
//! Generates the `CREATE TABLE` statements for the two record tables:
//!
//! - `{prefix}schemas` — serialized schema trees keyed by `schema_id`
//! - `{prefix}configs` — configuration documents keyed by `config_id`
//!
//! # Custom prefix
//!
//! Prefixes must contain only alphanumeric characters and underscores.
//! This enables multiple isolated registries (e.g., `prod_`, `test_`)
//! within the same SQLite database.

use config_schema_db::Namespace;

use crate::error::{Result, SqliteError};

/// Validates that a table prefix contains only alphanumeric characters and underscores.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    if !prefix.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Unprefixed table name holding records of `namespace`.
pub(crate) fn table_suffix(namespace: Namespace) -> &'static str {
    match namespace {
        Namespace::Schema => "schemas",
        Namespace::Config => "configs",
    }
}

/// Generates the complete SQL schema for all tables with the given prefix.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix contains characters
/// other than alphanumerics and underscores, or if it is empty.
pub fn generate_schema_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let mut sql = String::new();
    for namespace in Namespace::ALL {
        let table = table_suffix(namespace);
        sql.push_str(&format!(
            r#"
CREATE TABLE IF NOT EXISTS {prefix}{table} (
    id TEXT PRIMARY KEY NOT NULL CHECK (length(id) > 0),
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#
        ));
    }

    Ok(sql)
}

/// Generates SQL to drop all record tables.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix is invalid.
pub fn generate_drop_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let sql = Namespace::ALL
        .into_iter()
        .map(|namespace| format!("DROP TABLE IF EXISTS {prefix}{};\n", table_suffix(namespace)))
        .collect();

    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_prefix() {
        assert!(validate_prefix("cs_").is_ok());
        assert!(validate_prefix("test123").is_ok());
        assert!(validate_prefix("A_B_C").is_ok());
    }

    #[test]
    fn test_invalid_prefix_empty() {
        assert!(validate_prefix("").is_err());
    }

    #[test]
    fn test_invalid_prefix_special_chars() {
        assert!(validate_prefix("drop;--").is_err());
        assert!(validate_prefix("hello world").is_err());
        assert!(validate_prefix("test-prefix").is_err());
    }

    #[test]
    fn test_generate_schema_sql_contains_tables() {
        let sql = generate_schema_sql("cs_").unwrap();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS cs_schemas"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS cs_configs"));
    }

    #[test]
    fn test_generate_drop_sql_contains_all_tables() {
        let sql = generate_drop_sql("cs_").unwrap();
        assert!(sql.contains("DROP TABLE IF EXISTS cs_schemas"));
        assert!(sql.contains("DROP TABLE IF EXISTS cs_configs"));
    }

    #[test]
    fn test_generate_drop_sql_invalid_prefix() {
        assert!(generate_drop_sql("").is_err());
        assert!(generate_schema_sql("a b").is_err());
    }

    #[test]
    fn test_empty_id_rejected_by_check_constraint() {
        let sql = generate_schema_sql("t_").unwrap();
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(&sql).unwrap();

        assert!(
            conn.execute("INSERT INTO t_schemas (id, body) VALUES ('s', '{}')", [])
                .is_ok()
        );
        assert!(
            conn.execute("INSERT INTO t_schemas (id, body) VALUES ('', '{}')", [])
                .is_err()
        );
        assert!(
            conn.execute("INSERT INTO t_configs (id, body) VALUES ('s', NULL)", [])
                .is_err()
        );
    }
}
