//! Registry configuration file.
//!
//! Defines the YAML-serializable settings for a registry process: where
//! the SQLite database lives, which table prefix to use, and the default
//! log level.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! storage:
//!   path: config-schema.db
//!   prefix: cs_
//! log_level: warn
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default database file name.
pub const DEFAULT_DB_PATH: &str = "config-schema.db";
/// Default table prefix.
pub const DEFAULT_PREFIX: &str = "cs_";
/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Where and how records are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Prefix prepended to every table name.
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Top-level registry configuration.
///
/// # Examples
///
/// ```
/// # let yaml = r#"
/// # version: "1.0"
/// # storage: { path: /var/lib/schemas.db }
/// # "#;
/// let config: config_schema_db::RegistryConfig = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(config.storage.path.to_str(), Some("/var/lib/schemas.db"));
/// assert_eq!(config.storage.prefix, "cs_");
/// assert_eq!(config.log_level, "warn");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Log filter used when neither `-v` nor `RUST_LOG` is given.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            storage: StorageConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl RegistryConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DatabaseError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::DatabaseError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
