//! LogSink - logs each event via tracing

use adapter_registry::decode_params;
use contracts::{ContractError, Event, EventSink, EventType};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, trace, warn};

/// Level the sink logs events at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSinkConfig {
    #[serde(default)]
    pub level: LogLevel,
}

impl LogSinkConfig {
    pub fn from_params(params: &Value) -> Result<Self, ContractError> {
        decode_params(LogSink::TYPE, params)
    }
}

/// Sink that writes every event to the application log
pub struct LogSink {
    name: String,
    level: LogLevel,
}

impl LogSink {
    pub const TYPE: &'static str = "log";

    /// Create a new LogSink with the given name, logging at info
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, LogSinkConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: LogSinkConfig) -> Self {
        Self {
            name: name.into(),
            level: config.level,
        }
    }

    /// Create from an adapter payload (for the registry)
    pub fn from_params(name: &str, params: &Value) -> Result<Self, ContractError> {
        Ok(Self::with_config(name, LogSinkConfig::from_params(params)?))
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    fn log_event(&self, event: &Event) {
        let name = &self.name;
        macro_rules! emit {
            ($mac:ident) => {
                $mac!(
                    sink = %name,
                    event_type = %event.event_type,
                    title = %event.title,
                    description = %event.description,
                    source = %event.source,
                    source_event = %event.source_event_type,
                    link_url = ?event.link_url,
                    metadata = ?event.metadata,
                    "Event received"
                )
            };
        }

        match self.level {
            LogLevel::Trace => emit!(trace),
            LogLevel::Debug => emit!(debug),
            LogLevel::Info => emit!(info),
            LogLevel::Warn => emit!(warn),
            LogLevel::Error => emit!(error),
        }
    }
}

impl EventSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_process",
        skip(self, event),
        fields(sink = %self.name, event_type = %event.event_type)
    )]
    async fn process(&mut self, event: &Event) -> Result<(), ContractError> {
        match event.event_type {
            EventType::Unknown => Err(ContractError::unknown_event_type(&self.name, event.event_type)),
            EventType::ObjectAdded
            | EventType::ObjectUpdated
            | EventType::ObjectCompleted
            | EventType::ObjectFailed
            | EventType::ObjectDeleted
            | EventType::Informational
            | EventType::HealthIssue
            | EventType::Test => {
                self.log_event(event);
                Ok(())
            }
        }
    }

    #[instrument(name = "log_sink_shutdown", skip(self))]
    async fn shutdown(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

/// Registry validator: optional `level`, nothing else
pub fn validate_config(params: &Value) -> Result<(), ContractError> {
    LogSinkConfig::from_params(params).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_log_sink_accepts_known_types() {
        let mut sink = LogSink::new("test_log");
        for event_type in EventType::KNOWN {
            let event = Event::new(event_type, "t");
            assert!(sink.process(&event).await.is_ok(), "{event_type} should be logged");
        }
    }

    #[tokio::test]
    async fn test_log_sink_rejects_unknown() {
        let mut sink = LogSink::new("test_log");
        let err = sink
            .process(&Event::new(EventType::Unknown, "?"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::UnknownEventType { .. }));
    }

    #[test]
    fn test_level_config() {
        let sink = LogSink::from_params("l", &json!({"level": "warn"})).unwrap();
        assert_eq!(sink.level(), LogLevel::Warn);
        assert_eq!(LogSink::from_params("l", &Value::Null).unwrap().level(), LogLevel::Info);

        assert!(validate_config(&json!({"level": "loud"})).is_err());
        assert!(validate_config(&json!({"colour": "red"})).is_err());
    }
}
