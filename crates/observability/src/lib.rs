//! # Observability
//!
//! Tracing and Prometheus metrics.
//!
//! ## Features
//!
//! - Tracing initialization (JSON/Pretty/Compact)
//! - Prometheus exporter
//! - Event flow metrics (received, rejected, processed per sink)
//!
//! ## Usage
//!
//! ```ignore
//! use observability::{init_with_config, ObservabilityConfig};
//!
//! init_with_config(ObservabilityConfig::from_app_config(&app_config))?;
//! observability::record_event_processed("discord", true);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use contracts::AppConfig;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use contracts::LogFormat;

// Re-exports
pub use crate::metrics::{
    record_active_sinks, record_event_processed, record_event_received, record_event_rejected,
    record_sink_queue_depth, record_sink_retired,
};

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log format
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Default log filter, used when RUST_LOG is unset
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_port: None,
            default_log_level: "info".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Take logging and exporter settings from the application config
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            log_format: config.log_format,
            metrics_port: config.metrics_port,
            default_log_level: config.log_level.clone(),
        }
    }

    /// Level override from the command line, `None` keeps the configured one
    pub fn with_level(mut self, level: Option<&str>) -> Self {
        if let Some(level) = level {
            self.default_log_level = level.to_string();
        }
        self
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn format_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    match format {
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
        // Structured output keeps source locations for log shippers
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(false)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
    }
}

/// Install the global subscriber and, when a port is set, the exporter
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(&config.default_log_level))
        .with(format_layer(config.log_format))
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        level = %config.default_log_level,
        "Logging ready"
    );
    Ok(())
}

/// Initialize only the Prometheus exporter (tracing set up elsewhere)
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("Failed to install Prometheus exporter on port {port}"))?;

    tracing::info!(port, "Serving Prometheus metrics");
    Ok(())
}
