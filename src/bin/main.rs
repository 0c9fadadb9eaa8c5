//! relq CLI - Compile JSON query objects to SQL
//!
//! Usage:
//!   relq compile --schema <schema.json> --collection <name> --query <json> [--dialect <dialect>]
//!   relq check-schema --schema <schema.json>
//!
//! Examples:
//!   relq compile --schema blog.json --collection articles \
//!       --query '{"filter": {"author": {"name": {"_eq": "Ada"}}}, "sort": "-views"}'
//!   relq compile --schema blog.json --collection articles --query query.json --dialect mysql
//!   relq check-schema --schema blog.json

use clap::{Parser, Subcommand, ValueEnum};
use relq::compiler::Compiler;
use relq::config::Settings;
use relq::query::QuerySpec;
use relq::schema::SchemaOverview;
use relq::sql::Dialect;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relq")]
#[command(about = "relq - Compile relational JSON queries to multi-dialect SQL")]
#[command(version)]
struct Cli {
    /// Path to relq.toml (defaults to $RELQ_CONFIG or ./relq.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a query object against a collection
    Compile {
        /// Path to the schema JSON file
        #[arg(short, long)]
        schema: PathBuf,

        /// Root collection of the query
        #[arg(long)]
        collection: String,

        /// Query JSON file, or an inline JSON object
        #[arg(short, long)]
        query: String,

        /// SQL dialect to generate (overrides the config file)
        #[arg(short, long)]
        dialect: Option<DialectArg>,
    },

    /// Validate a schema file and print a summary
    CheckSchema {
        /// Path to the schema JSON file
        #[arg(short, long)]
        schema: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Postgres,
    Mysql,
    Mssql,
    Sqlite,
    Duckdb,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Mssql => Dialect::TSql,
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Duckdb => Dialect::DuckDb,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path),
        None => Settings::discover(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings.logging.level);

    match cli.command {
        Commands::Compile {
            schema,
            collection,
            query,
            dialect,
        } => cmd_compile(&settings, &schema, &collection, &query, dialect),
        Commands::CheckSchema { schema } => cmd_check_schema(&schema),
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Inline JSON objects are used as-is; anything else names a file.
fn read_query(arg: &str) -> Result<String, String> {
    if arg.trim_start().starts_with('{') {
        return Ok(arg.to_string());
    }
    let path = arg.strip_prefix('@').unwrap_or(arg);
    fs::read_to_string(path).map_err(|e| format!("Error reading query file '{}': {}", path, e))
}

fn cmd_compile(
    settings: &Settings,
    schema_path: &Path,
    collection: &str,
    query: &str,
    dialect: Option<DialectArg>,
) -> ExitCode {
    let schema = match SchemaOverview::load(schema_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading schema '{}': {}", schema_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let source = match read_query(query) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let spec = match serde_json::from_str::<QuerySpec>(&source) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("Invalid query: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut options = settings.compiler_options();
    if let Some(dialect) = dialect {
        options = options.with_dialect(dialect.into());
    }
    let dialect = options.dialect;
    debug!(collection, ?dialect, "compiling query");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let compiler = Compiler::new(&schema).with_options(options);
    match runtime.block_on(compiler.compile_query(collection, &spec)) {
        Ok(compiled) => {
            println!("{}", compiled.to_sql(dialect));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(collection, error = %e, "compilation failed");
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_check_schema(schema_path: &Path) -> ExitCode {
    let schema = match SchemaOverview::load(schema_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("✗ Schema '{}' is invalid: {}", schema_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match schema.validate() {
        Ok(summary) => {
            println!("✓ Schema '{}' is valid", schema_path.display());
            println!();
            println!("  Collections: {}", summary.collections);
            println!("  Fields:      {}", summary.fields);
            println!("  Relations:   {}", summary.relations);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Schema '{}' is invalid: {}", schema_path.display(), e);
            ExitCode::FAILURE
        }
    }
}
