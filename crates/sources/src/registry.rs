//! Built-in source registry

use std::sync::Arc;

use adapter_registry::Registry;
use contracts::{ContractError, EventSource};
use serde_json::Value;

use crate::generic_webhook::GenericWebhook;
use crate::radarr::Radarr;
use crate::sonarr::Sonarr;
use crate::starr::StarrConfig;

/// Registry producing shared producers
pub type SourceRegistry = Registry<Arc<dyn EventSource>>;

/// A fresh registry with every built-in source type registered
pub fn default_source_registry() -> SourceRegistry {
    let mut registry = SourceRegistry::new("source");
    register_builtin_sources(&mut registry);
    registry
}

/// Register `generic-webhook`, `radarr` and `sonarr`
pub fn register_builtin_sources(registry: &mut SourceRegistry) {
    registry.register(
        GenericWebhook::TYPE,
        |name, _| Ok(Arc::new(GenericWebhook::new(name)) as Arc<dyn EventSource>),
        None,
    );
    registry.register(
        Radarr::TYPE,
        |name, params| Ok(Arc::new(Radarr::from_params(name, params)?) as Arc<dyn EventSource>),
        Some(Box::new(|params: &Value| validate_starr(Radarr::TYPE, params))),
    );
    registry.register(
        Sonarr::TYPE,
        |name, params| Ok(Arc::new(Sonarr::from_params(name, params)?) as Arc<dyn EventSource>),
        Some(Box::new(|params: &Value| validate_starr(Sonarr::TYPE, params))),
    );
}

fn validate_starr(type_name: &str, params: &Value) -> Result<(), ContractError> {
    StarrConfig::from_params(type_name, params).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AdapterConfig, EventType};
    use serde_json::json;

    #[test]
    fn test_builtin_types() {
        let registry = default_source_registry();
        assert_eq!(registry.type_names(), vec!["generic-webhook", "radarr", "sonarr"]);
    }

    #[test]
    fn test_created_source_handles_payload() {
        let registry = default_source_registry();
        let source = registry.create("radarr", "movies", &Value::Null).unwrap();
        assert_eq!(source.kind(), "radarr");

        let event = source.handle(br#"{"eventType": "Test", "movie": {"title": "Test"}}"#).unwrap();
        assert_eq!(event.event_type, EventType::Test);
    }

    #[test]
    fn test_validation_before_construction() {
        let registry = default_source_registry();
        let configs = vec![
            AdapterConfig::new("hook", "generic-webhook"),
            AdapterConfig::new("tv", "sonarr").with_config(json!({"url": "ftp://nope"})),
        ];
        assert!(registry.create_all(&configs).is_err());
    }
}
