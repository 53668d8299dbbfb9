//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Webhook Relay - accepts flat webhook events and forwards them as nested JSON
#[derive(Parser, Debug)]
#[command(
    name = "webhook-relay",
    author,
    version,
    about = "Webhook relay: flat analytics events in, nested JSON out",
    long_about = "Accepts flat, abbreviated analytics events on POST /webhook, \n\
                  queues them, maps each one to a nested record and forwards it \n\
                  to the configured destination."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay until Ctrl+C / SIGTERM
    Serve(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `serve` command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults are used without it
    #[arg(short, long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the intake listen address
    #[arg(long, env = "RELAY_LISTEN")]
    pub listen: Option<String>,

    /// Override the destination URL
    #[arg(long, env = "RELAY_DESTINATION_URL")]
    pub destination_url: Option<String>,

    /// Override the intake queue capacity
    #[arg(long, env = "RELAY_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Override the maximum number of concurrent deliveries
    #[arg(long, env = "RELAY_MAX_IN_FLIGHT")]
    pub max_in_flight: Option<usize>,

    /// Override the metrics server port (0 = disabled)
    #[arg(long, env = "RELAY_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Validate configuration and exit without serving
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the effective configuration, defaults filled in
    #[arg(long)]
    pub effective: bool,
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
