mod commands;
mod config;
mod logging;
mod transport;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dbdraft_core::{Dialect, Error as CoreError};
use dbdraft_dbml::DbmlError;
use thiserror::Error;

use config::{DEFAULT_SETTINGS_PATH, LoggingSettings, load_or_create_settings};
use logging::init_logging;

#[derive(Debug, Error)]
enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Logging(#[from] logging::LoggingError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("dbml error: {0}")]
    Dbml(#[from] DbmlError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "dbdraft", version, about = "dbdraft CLI")]
struct Cli {
    /// Settings file, created with defaults when missing.
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    config: PathBuf,
    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert DBML to SQL.
    Export(ExportArgs),
    /// Normalize a DBML file.
    Format(FormatArgs),
    /// Print the diagram built from a DBML file as JSON.
    Inspect(InspectArgs),
    /// Print the JSON Schema of the diagram document.
    Schema(SchemaArgs),
    /// Answer JSON-lines envelopes from stdin.
    Listen(ListenArgs),
    /// Write the default settings file.
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// DBML source file.
    source: PathBuf,
    /// Target dialect; defaults to the configured one.
    #[arg(long)]
    dialect: Option<Dialect>,
    /// Output path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FormatArgs {
    source: PathBuf,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    source: PathBuf,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ListenArgs {
    /// Trusted origin; defaults to the configured one.
    #[arg(long)]
    origin: Option<String>,
    #[arg(long)]
    dialect: Option<Dialect>,
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Overwrite an existing settings file.
    #[arg(long, default_value_t = false)]
    force: bool,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    if let Command::Init(args) = &cli.command {
        init_logging(&LoggingSettings::default(), cli.log_file.as_deref())?;
        return commands::init(&cli.config, args.force);
    }

    let settings = load_or_create_settings(&cli.config)?;
    init_logging(&settings.logging, cli.log_file.as_deref())?;
    tracing::debug!(event = "settings_loaded", path = %cli.config.display());

    match cli.command {
        Command::Export(args) => commands::export(
            &args.source,
            args.dialect.unwrap_or(settings.default_dialect),
            args.out.as_deref(),
        ),
        Command::Format(args) => commands::format(&args.source, args.out.as_deref()),
        Command::Inspect(args) => commands::print_inspect(&args.source, args.out.as_deref()),
        Command::Schema(args) => commands::print_schema(args.out.as_deref()),
        Command::Listen(args) => {
            let origin = args.origin.unwrap_or(settings.trusted_origin);
            if origin.trim().is_empty() {
                return Err(CliError::InvalidConfig(
                    "--origin must not be empty".to_string(),
                ));
            }
            let dialect = args.dialect.unwrap_or(settings.default_dialect);
            commands::listen(&origin, dialect).map(|_| ())
        }
        Command::Init(_) => Ok(()),
    }
}
