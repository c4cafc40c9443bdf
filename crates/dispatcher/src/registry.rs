//! Built-in sink registry

use adapter_registry::{Registry, Validator};
use contracts::ContractError;
use serde_json::Value;

use crate::sinks::{self, DiscordWebhookSink, FileSink, LogSink};
use crate::worker::BoxedSink;

/// Registry producing type-erased sinks
pub type SinkRegistry = Registry<BoxedSink>;

fn validator(f: fn(&Value) -> Result<(), ContractError>) -> Option<Validator> {
    Some(Box::new(f))
}

/// A fresh registry with every built-in sink type registered
pub fn default_sink_registry() -> SinkRegistry {
    let mut registry = SinkRegistry::new("sink");
    register_builtin_sinks(&mut registry);
    registry
}

/// Register `log`, `file` and `discord-webhook`
pub fn register_builtin_sinks(registry: &mut SinkRegistry) {
    registry.register(
        LogSink::TYPE,
        |name, params| LogSink::from_params(name, params).map(BoxedSink::new),
        validator(sinks::log_validate),
    );
    registry.register(
        FileSink::TYPE,
        |name, params| FileSink::from_params(name, params).map(BoxedSink::new),
        validator(sinks::file_validate),
    );
    registry.register(
        DiscordWebhookSink::TYPE,
        |name, params| DiscordWebhookSink::from_params(name, params).map(BoxedSink::new),
        validator(sinks::discord_validate),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapter_registry::RegistryError;
    use contracts::AdapterConfig;
    use serde_json::json;

    #[test]
    fn test_builtin_types() {
        let registry = default_sink_registry();
        assert_eq!(registry.type_names(), vec!["discord-webhook", "file", "log"]);
    }

    #[test]
    fn test_create_log_sink() {
        let registry = default_sink_registry();
        let sink = registry.create("log", "console", &Value::Null).unwrap();
        assert_eq!(sink.name(), "console");
    }

    #[test]
    fn test_invalid_discord_config_rejected() {
        let registry = default_sink_registry();
        let configs = vec![
            AdapterConfig::new("console", "log"),
            AdapterConfig::new("alerts", "discord-webhook")
                .with_config(json!({ "webhook_url": "https://example.com/nope" })),
        ];
        assert!(matches!(
            registry.create_all(&configs),
            Err(RegistryError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_unknown_sink_type() {
        let registry = default_sink_registry();
        assert!(matches!(
            registry.create("slack", "x", &Value::Null),
            Err(RegistryError::UnknownType { .. })
        ));
    }
}
