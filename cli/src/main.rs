use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use config_schema_core::{SchemaTree, ValidationReport};
use config_schema_db::{Namespace, Outcome, RegistryConfig, SchemaRegistry};
use config_schema_sqlite::{Migration, SqliteStore};
use rusqlite::Connection;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code for a document or definition that was checked and rejected.
const EXIT_INVALID: u8 = 2;

/// CLI-specific report format with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "config-schema")]
#[command(about = "Register config schemas and validate documents against them")]
struct Cli {
    /// Registry configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Database file path. Overrides the configuration file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Table prefix. Overrides the configuration file.
    #[arg(long, global = true)]
    prefix: Option<String>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register, inspect, and remove schemas.
    Schema(SchemaArgs),
    /// Store, inspect, and remove configuration documents.
    Config(ConfigArgs),
    /// Validate a configuration document against a stored schema.
    Validate(ValidateArgs),
    /// SQLite table lifecycle operations.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args)]
struct SchemaArgs {
    #[command(subcommand)]
    operation: SchemaOperation,
}

#[derive(Debug, Subcommand)]
enum SchemaOperation {
    /// Register a new schema from a definition file.
    Set(DefinitionFileArgs),
    /// Replace an existing schema from a definition file.
    Update(DefinitionFileArgs),
    /// Print a stored schema tree.
    Get(IdArgs),
    /// Delete a stored schema.
    Delete(IdArgs),
    /// Print the ids of all stored schemas.
    List,
    /// Check a definition file without touching the database.
    Check(DefinitionFileArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    operation: ConfigOperation,
}

#[derive(Debug, Subcommand)]
enum ConfigOperation {
    /// Store a new configuration document.
    Set(DocumentArgs),
    /// Replace a stored configuration document.
    Update(DocumentArgs),
    /// Print a stored configuration document.
    Get(IdArgs),
    /// Delete a stored configuration document.
    Delete(IdArgs),
    /// Print the ids of all stored configuration documents.
    List,
}

#[derive(Debug, Args)]
struct DefinitionFileArgs {
    /// JSON file with `schema_id` and `schema_body`, or `-` for stdin.
    file: PathBuf,
}

#[derive(Debug, Args)]
struct IdArgs {
    /// Record id.
    id: String,
}

#[derive(Debug, Args)]
struct DocumentArgs {
    /// Configuration id.
    id: String,
    /// JSON document file, or `-` for stdin.
    file: PathBuf,
}

#[derive(Debug, Args)]
#[command(group(clap::ArgGroup::new("source").required(true).args(["config_id", "file"])))]
struct ValidateArgs {
    /// Schema to validate against.
    schema_id: String,
    /// Validate a stored configuration document.
    #[arg(long)]
    config_id: Option<String>,
    /// Validate a JSON document file, or `-` for stdin.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Report format.
    #[arg(long, default_value = "text")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct MigrateArgs {
    #[command(subcommand)]
    operation: MigrateOperation,
}

#[derive(Debug, Subcommand)]
enum MigrateOperation {
    /// Create the record tables.
    Up,
    /// Drop the record tables.
    Down,
    /// Register every JSON schema definition in a directory.
    Seed(MigrateSourceArgs),
    /// Drop tables, recreate, and reseed from a directory.
    Refresh(MigrateSourceArgs),
    /// Show table status and record counts.
    Status,
}

#[derive(Debug, Args)]
struct MigrateSourceArgs {
    /// Source directory with JSON schema definitions.
    source: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = load_config(&cli).and_then(|config| {
        init_logging(cli.verbose, &config.log_level);
        debug!(
            db = %config.storage.path.display(),
            prefix = %config.storage.prefix,
            "resolved configuration"
        );
        match cli.command {
            Command::Schema(args) => run_schema(&config, args),
            Command::Config(args) => run_config(&config, args),
            Command::Validate(args) => run_validate(&config, args),
            Command::Migrate(args) => run_migrate(&config, args),
        }
    });

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Reads the optional configuration file, then applies `--db` and `--prefix`.
fn load_config(cli: &Cli) -> Result<RegistryConfig, String> {
    let mut config = match &cli.config {
        Some(path) => RegistryConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => RegistryConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.storage.path = db.clone();
    }
    if let Some(prefix) = &cli.prefix {
        config.storage.prefix = prefix.clone();
    }
    Ok(config)
}

/// Installs the stderr subscriber.
///
/// `-v` flags win over `RUST_LOG`, which wins over the configured level.
fn init_logging(verbose: u8, configured: &str) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(configured))
            .unwrap_or_else(|_| EnvFilter::new(config_schema_db::DEFAULT_LOG_LEVEL)),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn open_connection(config: &RegistryConfig) -> Result<Connection, String> {
    let path = &config.storage.path;
    Connection::open(path).map_err(|e| format!("Failed to open database '{}': {e}", path.display()))
}

fn open_migration(config: &RegistryConfig) -> Result<Migration, String> {
    Migration::new(open_connection(config)?, &config.storage.prefix)
        .map_err(|e| format!("Failed to initialize migration: {e}"))
}

/// Opens the database with its tables in place.
fn open_database(config: &RegistryConfig) -> Result<Connection, String> {
    let mut migration = open_migration(config)?;
    migration
        .up()
        .map_err(|e| format!("Failed to prepare tables: {e}"))?;
    Ok(migration.into_connection())
}

fn registry<'a>(
    conn: &'a Connection,
    config: &RegistryConfig,
) -> Result<SchemaRegistry<SqliteStore<'a>>, String> {
    let store = SqliteStore::new(conn, &config.storage.prefix).map_err(|e| e.to_string())?;
    Ok(SchemaRegistry::new(store))
}

// ---------------------------------------------------------------------------
// Schema commands
// ---------------------------------------------------------------------------

fn run_schema(config: &RegistryConfig, args: SchemaArgs) -> Result<ExitCode, String> {
    match args.operation {
        SchemaOperation::Check(file) => run_schema_check(&file.file),
        operation => run_stored_schema(config, operation),
    }
}

fn run_stored_schema(
    config: &RegistryConfig,
    operation: SchemaOperation,
) -> Result<ExitCode, String> {
    let conn = open_database(config)?;
    let registry = registry(&conn, config)?;

    let outcome = match operation {
        SchemaOperation::Set(file) => registry.register_schema(&read_json(&file.file)?),
        SchemaOperation::Update(file) => registry.update_schema(&read_json(&file.file)?),
        SchemaOperation::Delete(id) => registry.delete_schema(&id.id),
        SchemaOperation::Get(id) => {
            let tree = registry
                .get_schema(&id.id)
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("Schema '{}' not found", id.id))?;
            let json = tree
                .to_json_pretty()
                .map_err(|e| format!("JSON serialization failed: {e}"))?;
            println!("{json}");
            return Ok(ExitCode::SUCCESS);
        }
        SchemaOperation::List => return print_ids(registry.store(), Namespace::Schema),
        SchemaOperation::Check(file) => return run_schema_check(&file.file),
    }
    .map_err(|e| e.to_string())?;

    report_outcome(outcome)
}

fn run_schema_check(path: &Path) -> Result<ExitCode, String> {
    let definition = read_json(path)?;
    match SchemaTree::from_definition(&definition) {
        Ok(tree) => {
            println!(
                "Schema '{}' is valid ({} top-level fields).",
                tree.schema_id(),
                tree.field_count()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("Invalid schema format: {err}");
            Ok(ExitCode::from(EXIT_INVALID))
        }
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn run_config(config: &RegistryConfig, args: ConfigArgs) -> Result<ExitCode, String> {
    let conn = open_database(config)?;
    let registry = registry(&conn, config)?;

    let outcome = match args.operation {
        ConfigOperation::Set(doc) => registry.set_config(&doc.id, &read_json(&doc.file)?),
        ConfigOperation::Update(doc) => registry.update_config(&doc.id, &read_json(&doc.file)?),
        ConfigOperation::Delete(id) => registry.delete_config(&id.id),
        ConfigOperation::Get(id) => {
            let document = registry
                .get_config(&id.id)
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("Configuration '{}' not found", id.id))?;
            let json = serde_json::to_string_pretty(&document)
                .map_err(|e| format!("JSON serialization failed: {e}"))?;
            println!("{json}");
            return Ok(ExitCode::SUCCESS);
        }
        ConfigOperation::List => return print_ids(registry.store(), Namespace::Config),
    }
    .map_err(|e| e.to_string())?;

    report_outcome(outcome)
}

fn print_ids(store: &SqliteStore<'_>, namespace: Namespace) -> Result<ExitCode, String> {
    let ids = store.keys(namespace).map_err(|e| e.to_string())?;
    debug!(%namespace, count = ids.len(), "listing ids");
    for id in ids {
        println!("{id}");
    }
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn run_validate(config: &RegistryConfig, args: ValidateArgs) -> Result<ExitCode, String> {
    let conn = open_database(config)?;
    let registry = registry(&conn, config)?;

    let report = match (&args.config_id, &args.file) {
        (Some(config_id), _) => registry.validate_stored_config(&args.schema_id, config_id),
        (None, Some(file)) => registry.explain_document(&args.schema_id, &read_json(file)?),
        (None, None) => return Err("Specify --config-id or --file".to_string()),
    }
    .map_err(|e| e.to_string())?;

    print_report(&report, args.format)?;
    if report.is_valid() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_INVALID))
    }
}

fn print_report(report: &ValidationReport, format: CliOutputFormat) -> Result<(), String> {
    match format {
        CliOutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .map_err(|e| format!("JSON serialization failed: {e}"))?;
            println!("{json}");
        }
        CliOutputFormat::Text if report.is_valid() => {
            println!("Configuration is valid for schema '{}'.", report.schema_id());
        }
        CliOutputFormat::Text => {
            println!(
                "Configuration is invalid for schema '{}' ({} violations):",
                report.schema_id(),
                report.violations().len()
            );
            for violation in report.violations() {
                println!("  {violation}");
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------------

fn run_migrate(config: &RegistryConfig, args: MigrateArgs) -> Result<ExitCode, String> {
    let mut migration = open_migration(config)?;
    let db = config.storage.path.display();
    let prefix = &config.storage.prefix;

    match args.operation {
        MigrateOperation::Up => {
            migration
                .up()
                .map_err(|e| format!("Migration up failed: {e}"))?;
            println!("Migration up complete. Tables created with prefix '{prefix}' in '{db}'.");
        }
        MigrateOperation::Down => {
            migration
                .down()
                .map_err(|e| format!("Migration down failed: {e}"))?;
            println!("Migration down complete. Tables with prefix '{prefix}' dropped from '{db}'.");
        }
        MigrateOperation::Seed(args) => {
            migration
                .up()
                .map_err(|e| format!("Migration up failed: {e}"))?;
            let report = migration
                .seed(&args.source)
                .map_err(|e| format!("Seed failed: {e}"))?;
            println!("Seed complete:");
            println!("  Schemas inserted: {}", report.schemas_inserted);
        }
        MigrateOperation::Refresh(args) => {
            let report = migration
                .refresh(&args.source)
                .map_err(|e| format!("Refresh failed: {e}"))?;
            println!("Refresh complete (tables dropped, recreated, and reseeded):");
            println!("  Schemas inserted: {}", report.schemas_inserted);
        }
        MigrateOperation::Status => {
            let status = migration
                .status()
                .map_err(|e| format!("Failed to get migration status: {e}"))?;
            println!("Migration Status:");
            println!(
                "  Tables exist: {}",
                if status.tables_exist { "yes" } else { "no" }
            );
            println!("  Schema count: {}", status.schema_count);
            println!("  Config count: {}", status.config_count);
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Prints a successful outcome, or turns a rejected write into an error.
fn report_outcome(outcome: Outcome) -> Result<ExitCode, String> {
    if outcome.is_success() {
        println!("{outcome}");
        Ok(ExitCode::SUCCESS)
    } else {
        Err(outcome.to_string())
    }
}

/// Reads JSON from `path`, or from stdin when `path` is `-`.
fn read_json(path: &Path) -> Result<Value, String> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Failed to read stdin: {e}"))?;
        buf
    } else {
        fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {e}", path.display()))?
    };
    serde_json::from_str(&text).map_err(|e| format!("Invalid JSON in '{}': {e}", path.display()))
}
