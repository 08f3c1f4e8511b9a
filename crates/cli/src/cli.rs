//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Multistub - primary-plus-mirrors query fan-out
#[derive(Parser, Debug)]
#[command(
    name = "multistub",
    author,
    version,
    about = "Primary-plus-mirrors query fan-out",
    long_about = "Runs one SQL statement against a main replica and returns its rows, \n\
                  while replaying the same statement on every mirror replica in the \n\
                  background. Mirror failures are logged and never affect the result."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MULTISTUB_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "MULTISTUB_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log level derived from `-v`/`-q`
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration file without querying
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Fan a query out over the configured targets
    Query(QueryArgs),
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "multistub.toml", env = "MULTISTUB_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "multistub.toml", env = "MULTISTUB_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `query` command
#[derive(Parser, Debug, Clone)]
pub struct QueryArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "multistub.toml", env = "MULTISTUB_CONFIG")]
    pub config: PathBuf,

    /// SQL statement, `?` placeholders bind positional parameters
    #[arg(long)]
    pub sql: String,

    /// Positional parameter (null, int:N, real:F, text:S, blob:HEX or a bare literal)
    #[arg(short = 'p', long = "param", allow_hyphen_values = true)]
    pub params: Vec<String>,

    /// Run mirrors detached without a supervising execution context
    #[arg(long)]
    pub no_context: bool,

    /// Seconds to wait for background mirrors before reporting them as pending (0 = no limit)
    #[arg(long, default_value = "30", env = "MULTISTUB_MIRROR_TIMEOUT")]
    pub mirror_timeout: u64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
