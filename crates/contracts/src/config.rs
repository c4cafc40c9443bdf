//! AppConfig - Config Loader output
//!
//! Queue sizing, logging, HTTP listener and the ordered source/sink lists.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Capacity of the dispatcher ingress queue
    #[serde(default = "default_queue_size")]
    #[validate(range(min = 1, message = "queue_size must be >= 1"))]
    pub queue_size: usize,

    /// Capacity of each sink's own queue
    #[serde(default = "default_queue_size")]
    #[validate(range(min = 1, message = "sink_queue_size must be >= 1"))]
    pub sink_queue_size: usize,

    /// Default log filter directive (RUST_LOG takes precedence)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Listen address for the webhook server
    #[serde(default = "default_interface")]
    #[validate(ip(message = "interface must be an IP address"))]
    pub interface: String,

    #[serde(default = "default_port")]
    #[validate(range(min = 1, message = "port must be > 0"))]
    pub port: u16,

    /// Prometheus exporter port (None = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Overall budget for draining sinks at exit
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Event producers, addressed by name under `/webhook/{name}`
    #[serde(default)]
    #[validate(nested)]
    pub sources: Vec<AdapterConfig>,

    /// Delivery destinations
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<AdapterConfig>,
}

fn default_queue_size() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_interface() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout_secs() -> u64 {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            queue_size: default_queue_size(),
            sink_queue_size: default_queue_size(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            interface: default_interface(),
            port: default_port(),
            metrics_port: None,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            sources: Vec::new(),
            sinks: Vec::new(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human readable multi-line format
    #[default]
    #[serde(alias = "console")]
    Pretty,
    /// Compact single-line format
    Compact,
}

/// One configured adapter instance (source or sink)
///
/// `adapter_type` selects the registry entry; `config` is handed to that
/// entry's validator and constructor untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AdapterConfig {
    /// Instance name, unique within its list
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: String,

    /// Registry type tag (e.g. "log", "discord-webhook")
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type cannot be empty"))]
    pub adapter_type: String,

    /// Adapter specific payload
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub config: serde_json::Value,
}

impl AdapterConfig {
    pub fn new(name: impl Into<String>, adapter_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            adapter_type: adapter_type.into(),
            config: serde_json::Value::Null,
        }
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}
