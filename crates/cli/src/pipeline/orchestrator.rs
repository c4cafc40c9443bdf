//! Pipeline orchestrator - wires sources, dispatcher and sinks together.
//!
//! Lifecycle: validate adapters, bind the listener, start the dispatcher
//! with its sinks, register sources, serve HTTP. SIGHUP reloads the
//! config file; the shutdown future stops HTTP first and then drains the
//! dispatcher within `shutdown_timeout_secs`.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use config_loader::{validate_adapters, AppConfig, ConfigLoader};
use contracts::{Event, EventType, Metadata};
use dispatcher::{create_dispatcher, default_sink_registry, Dispatcher, SinkRegistry};
use gateway::SourceManager;
use sources::{default_source_registry, SourceRegistry};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use super::signals::ReloadSignal;
use super::PipelineStats;
use crate::error::CliError;

/// Grace period for in-flight HTTP requests at shutdown
const HTTP_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Loaded configuration, CLI overrides applied
    pub app: AppConfig,

    /// File re-read on SIGHUP
    pub config_path: PathBuf,

    /// Send a test event to every sink once started
    pub startup_event: bool,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
    sinks: SinkRegistry,
    sources: SourceRegistry,
}

impl Pipeline {
    /// Create a pipeline with the built-in adapter types
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_registries(config, default_sink_registry(), default_source_registry())
    }

    pub fn with_registries(config: PipelineConfig, sinks: SinkRegistry, sources: SourceRegistry) -> Self {
        Self {
            config,
            sinks,
            sources,
        }
    }

    /// Run until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let app = &self.config.app;

        validate_adapters(app, &self.sinks, &self.sources)
            .context("Adapter configuration rejected")?;

        if let Some(port) = app.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let address = format!("{}:{}", app.interface, app.port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| CliError::bind(&address, e))?;
        let listen_address = listener
            .local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or(address);

        let mut dispatcher = create_dispatcher(app, &self.sinks)
            .await
            .context("Failed to start dispatcher")?;

        let manager = Arc::new(SourceManager::new(dispatcher.sender()));
        if let Err(e) = manager.reconfigure_from(&self.sources, &app.sources).await {
            stop_quietly(&mut dispatcher).await;
            return Err(e).context("Failed to configure sources");
        }

        let mut reloads = match ReloadSignal::install() {
            Ok(reloads) => reloads,
            Err(e) => {
                stop_quietly(&mut dispatcher).await;
                return Err(e.into());
            }
        };

        let (http_stop_tx, http_stop_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(gateway::serve(listener, Arc::clone(&manager), async move {
            let _ = http_stop_rx.await;
        }));

        info!(
            address = %listen_address,
            sources = app.sources.len(),
            sinks = app.sinks.len(),
            "Informer started"
        );

        if self.config.startup_event {
            match dispatcher.enqueue_event(startup_event()).await {
                Ok(()) => info!("Startup test event sent"),
                Err(e) => warn!(error = %e, "Startup test event not accepted"),
            }
        }

        let mut running = app.clone();
        let mut stats = PipelineStats {
            listen_address,
            ..Default::default()
        };
        let mut server_failure = None;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                result = &mut server => {
                    server_failure = Some(match result {
                        Ok(Ok(())) => "stopped unexpectedly".to_string(),
                        Ok(Err(e)) => e.to_string(),
                        Err(e) => e.to_string(),
                    });
                    break;
                }
                Some(()) = reloads.recv() => {
                    match reload_config(&self.config.config_path, &self.sinks, &self.sources, &dispatcher, &manager, &running).await {
                        Ok(config) => {
                            running = config;
                            stats.reloads_applied += 1;
                        }
                        Err(e) => {
                            stats.reloads_failed += 1;
                            error!(error = %format!("{e:#}"), "Configuration reload failed, keeping running configuration");
                        }
                    }
                }
            }
        }

        // HTTP first, then the sinks
        if server_failure.is_none() {
            let _ = http_stop_tx.send(());
            match timeout(HTTP_SHUTDOWN_TIMEOUT, &mut server).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => warn!(error = %e, "HTTP server exited with an error"),
                Ok(Err(e)) => error!(error = %e, "HTTP server task panicked"),
                Err(_) => {
                    warn!("HTTP server did not stop in time, aborting open connections");
                    server.abort();
                }
            }
        }

        stats.active_sources = manager.source_names().await.len();
        let handles = dispatcher.metrics_handles().await;
        let budget = Duration::from_secs(running.shutdown_timeout_secs);
        match timeout(budget, dispatcher.stop()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Dispatcher stop reported an error"),
            Err(_) => {
                warn!(timeout_secs = budget.as_secs(), "Sinks did not drain before the shutdown timeout");
                stats.drain_timed_out = true;
            }
        }

        stats.sinks = handles
            .into_iter()
            .map(|(name, metrics)| (name, metrics.snapshot()))
            .collect();
        stats.duration = start_time.elapsed();

        if let Some(message) = server_failure {
            return Err(CliError::server(message).into());
        }
        Ok(stats)
    }
}

/// Re-read `path` and swap the sink and source sets
///
/// Nothing changes unless the new file parses, validates and every adapter
/// is accepted by its registry. Listener, queue and logging settings only
/// take effect on restart.
#[instrument(name = "pipeline_reload", skip_all, fields(config = %path.display()))]
pub async fn reload_config(
    path: &Path,
    sinks: &SinkRegistry,
    sources: &SourceRegistry,
    dispatcher: &Dispatcher,
    manager: &SourceManager,
    running: &AppConfig,
) -> Result<AppConfig> {
    info!("Reloading configuration");

    let config = ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    validate_adapters(&config, sinks, sources).context("Adapter configuration rejected")?;

    dispatcher
        .reconfigure_from(sinks, &config.sinks)
        .await
        .context("Failed to apply sinks")?;
    manager
        .reconfigure_from(sources, &config.sources)
        .await
        .context("Failed to apply sources")?;

    if restart_required(running, &config) {
        warn!("Listener, queue and logging changes take effect on restart");
    }

    info!(
        sources = config.sources.len(),
        sinks = config.sinks.len(),
        "Configuration reloaded"
    );
    Ok(config)
}

fn restart_required(running: &AppConfig, new: &AppConfig) -> bool {
    running.interface != new.interface
        || running.port != new.port
        || running.metrics_port != new.metrics_port
        || running.queue_size != new.queue_size
        || running.sink_queue_size != new.sink_queue_size
        || running.log_level != new.log_level
        || running.log_format != new.log_format
}

/// Boot-time event that exercises every sink
fn startup_event() -> Event {
    let mut metadata = Metadata::new();
    metadata.add("test", "test");

    Event::new(EventType::ObjectAdded, "Test Event")
        .with_description("This is a test event.")
        .with_source("Informer", "TestEvent", "")
        .with_metadata(metadata)
}

async fn stop_quietly(dispatcher: &mut Dispatcher) {
    if let Err(e) = dispatcher.stop().await {
        warn!(error = %e, "Dispatcher stop reported an error");
    }
}
