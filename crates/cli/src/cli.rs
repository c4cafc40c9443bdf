//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Informer - webhook event router with fan-out delivery
#[derive(Parser, Debug)]
#[command(
    name = "informer",
    author,
    version,
    about = "Webhook event router with fan-out delivery",
    long_about = "Receives webhooks from configured sources (Radarr, Sonarr, generic JSON),\n\
                  normalizes them into events and delivers every event to each configured\n\
                  sink (log, file, Discord webhook)."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "INFORMER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (defaults to the config file's `log_format`)
    #[arg(long, value_enum, global = true, env = "INFORMER_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP front-end and dispatcher
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display registered adapter types and configuration
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "informer.toml", env = "INFORMER_CONFIG")]
    pub config: PathBuf,

    /// Override listen interface from configuration
    #[arg(long, env = "INFORMER_INTERFACE")]
    pub interface: Option<String>,

    /// Override listen port from configuration
    #[arg(long, env = "INFORMER_PORT")]
    pub port: Option<u16>,

    /// Override Prometheus exporter port from configuration
    #[arg(long, env = "INFORMER_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Send a test event to every sink once started
    #[arg(long)]
    pub startup_event: bool,

    /// Validate configuration and adapters, then exit
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "informer.toml", env = "INFORMER_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Configuration file to describe (adapter types only if omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for contracts::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
