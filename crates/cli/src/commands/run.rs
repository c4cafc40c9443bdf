//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::{validate, validate_adapters, AppConfig, ConfigLoader};
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{shutdown_signal, Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut app = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    apply_overrides(&mut app, args)?;

    info!(
        interface = %app.interface,
        port = app.port,
        sources = app.sources.len(),
        sinks = app.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        validate_adapters(
            &app,
            &dispatcher::default_sink_registry(),
            &sources::default_source_registry(),
        )
        .context("Adapter configuration rejected")?;
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&app);
        return Ok(());
    }

    let shutdown_timeout_secs = app.shutdown_timeout_secs;
    let pipeline = Pipeline::new(PipelineConfig {
        app,
        config_path: args.config.clone(),
        startup_event: args.startup_event,
    });

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        delivered = stats.delivered(),
        failed = stats.failed(),
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline stopped"
    );
    stats.print_summary();

    if stats.drain_timed_out {
        return Err(CliError::shutdown(format!(
            "sinks did not drain within {shutdown_timeout_secs}s"
        ))
        .into());
    }

    info!("Informer stopped");
    Ok(())
}

/// Apply `--interface`/`--port`/`--metrics-port` and re-check the result
///
/// The file was validated on load; the overridden config must hold to the
/// same rules a SIGHUP reload of that file will.
fn apply_overrides(app: &mut AppConfig, args: &RunArgs) -> Result<()> {
    if let Some(ref interface) = args.interface {
        info!(interface = %interface, "Overriding listen interface from CLI");
        app.interface = interface.clone();
    }
    if let Some(port) = args.port {
        info!(port = port, "Overriding listen port from CLI");
        app.port = port;
    }
    if let Some(port) = args.metrics_port {
        info!(port = port, "Overriding metrics port from CLI");
        app.metrics_port = Some(port);
    }

    validate(app).context("Command line overrides rejected")?;
    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(app: &AppConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Listener: {}:{}", app.interface, app.port);
    println!(
        "Queues: ingress {}, per sink {}",
        app.queue_size, app.sink_queue_size
    );

    println!("\nSources ({}):", app.sources.len());
    for source in &app.sources {
        println!("  - {} ({}) -> /webhook/{}", source.name, source.adapter_type, source.name);
    }

    println!("\nSinks ({}):", app.sinks.len());
    for sink in &app.sinks {
        println!("  - {} ({})", sink.name, sink.adapter_type);
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    fn run_args(argv: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_overrides_applied() {
        let args = run_args(&["informer", "run", "--interface", "127.0.0.1", "--port", "9000"]);
        let mut app = AppConfig::default();
        apply_overrides(&mut app, &args).unwrap();

        assert_eq!(app.interface, "127.0.0.1");
        assert_eq!(app.port, 9000);
        assert_eq!(app.metrics_port, None);
    }

    #[test]
    fn test_invalid_overrides_rejected() {
        let mut app = AppConfig::default();
        let err = apply_overrides(&mut app, &run_args(&["informer", "run", "--port", "0"])).unwrap_err();
        assert!(format!("{err:#}").contains("port must be > 0"));

        let mut app = AppConfig::default();
        let args = run_args(&["informer", "run", "--interface", "not-an-ip"]);
        assert!(apply_overrides(&mut app, &args).is_err());
    }
}
