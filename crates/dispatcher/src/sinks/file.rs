//! FileSink - appends events to disk as JSON lines

use std::path::PathBuf;

use adapter_registry::decode_params;
use contracts::{ContractError, Event, EventSink, EventType};
use serde::Deserialize;
use serde_json::Value;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone, Deserialize)]
pub struct FileSinkConfig {
    /// Output file, created if missing and appended to otherwise
    pub path: PathBuf,
}

impl FileSinkConfig {
    pub fn from_params(params: &Value) -> Result<Self, ContractError> {
        let config: Self = decode_params(FileSink::TYPE, params)?;
        if config.path.as_os_str().is_empty() {
            return Err(ContractError::config_validation("path", "cannot be empty"));
        }
        Ok(config)
    }
}

/// Sink that writes one JSON object per line
///
/// The file is opened lazily on the first event so construction never
/// touches the filesystem.
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: Option<BufWriter<File>>,
    written: u64,
}

impl FileSink {
    pub const TYPE: &'static str = "file";

    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> Self {
        Self {
            name: name.into(),
            config,
            writer: None,
            written: 0,
        }
    }

    /// Create from an adapter payload (for the registry)
    pub fn from_params(name: &str, params: &Value) -> Result<Self, ContractError> {
        Ok(Self::new(name, FileSinkConfig::from_params(params)?))
    }

    async fn writer(&mut self) -> Result<&mut BufWriter<File>, ContractError> {
        if self.writer.is_none() {
            if let Some(parent) = self.config.path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.config.path)
                .await?;
            debug!(sink = %self.name, path = %self.config.path.display(), "File opened");
            self.writer = Some(BufWriter::new(file));
        }
        self.writer
            .as_mut()
            .ok_or_else(|| ContractError::sink_write(&self.name, "writer unavailable"))
    }
}

impl EventSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_process",
        skip(self, event),
        fields(sink = %self.name, event_type = %event.event_type)
    )]
    async fn process(&mut self, event: &Event) -> Result<(), ContractError> {
        if event.event_type == EventType::Unknown {
            return Err(ContractError::unknown_event_type(&self.name, event.event_type));
        }

        let mut line = serde_json::to_vec(event)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        line.push(b'\n');

        let writer = self.writer().await?;
        writer.write_all(&line).await?;
        writer.flush().await?;
        self.written += 1;
        Ok(())
    }

    #[instrument(name = "file_sink_shutdown", skip(self))]
    async fn shutdown(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await?;
            writer.get_mut().sync_all().await?;
        }
        info!(sink = %self.name, written = self.written, "FileSink closed");
        Ok(())
    }
}

/// Registry validator: `path` is required and non-empty
pub fn validate_config(params: &Value) -> Result<(), ContractError> {
    FileSinkConfig::from_params(params).map(|_| ())
}
