//! # Informer CLI
//!
//! Command line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Pipeline orchestration and lifecycle management
//! - Graceful shutdown and SIGHUP reload

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use config_loader::{AppConfig, ConfigLoader};
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // `run` takes its logging defaults from the config file; load errors
    // are reported by the command itself
    let file_config = match &cli.command {
        Commands::Run(args) => ConfigLoader::load_from_path(&args.config).ok(),
        Commands::Validate(_) | Commands::Info(_) => None,
    };
    init_logging(&cli, file_config.as_ref())?;

    info!(version = env!("CARGO_PKG_VERSION"), "Informer CLI starting");

    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %format!("{e:#}"), "Command failed");
    }

    result
}

/// Initialize logging
///
/// `-q`/`-v` pick the level, otherwise the config's `log_level`; the
/// format flag wins over the config's `log_format`. `RUST_LOG` overrides
/// both levels.
fn init_logging(cli: &Cli, config: Option<&AppConfig>) -> Result<()> {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Some("warn"),
        (false, 0) => None,
        (false, 1) => Some("debug"),
        (false, _) => Some("trace"),
    };

    let mut settings = config
        .map(ObservabilityConfig::from_app_config)
        .unwrap_or_default()
        .with_level(level);
    if let Some(format) = cli.log_format {
        settings.log_format = format.into();
    }
    // Exporter is installed by `run` once overrides are applied
    settings.metrics_port = None;

    observability::init_with_config(settings)
}
