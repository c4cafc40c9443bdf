//! GenericWebhook - accepts events already in the normalized JSON shape

use contracts::{ContractError, Event, EventSource};
use tracing::debug;

pub struct GenericWebhook {
    name: String,
}

impl GenericWebhook {
    pub const TYPE: &'static str = "generic-webhook";

    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl EventSource for GenericWebhook {
    fn kind(&self) -> &str {
        Self::TYPE
    }

    fn handle(&self, body: &[u8]) -> Result<Event, ContractError> {
        let event: Event = serde_json::from_slice(body)
            .map_err(|e| ContractError::source_payload(&self.name, e.to_string()))?;
        debug!(source = %self.name, event_type = %event.event_type, "Generic event decoded");
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::EventType;

    #[test]
    fn test_decodes_event() {
        let source = GenericWebhook::new("hook");
        let body = br#"{"type": "object_added", "title": "hello", "metadata": [{"name": "k", "value": "v"}]}"#;
        let event = source.handle(body).unwrap();
        assert_eq!(event.event_type, EventType::ObjectAdded);
        assert_eq!(event.title, "hello");
        assert_eq!(event.metadata.get("k"), Some("v"));
    }

    #[test]
    fn test_unrecognized_type_is_unknown() {
        let source = GenericWebhook::new("hook");
        let event = source.handle(br#"{"type": "exploded"}"#).unwrap();
        assert_eq!(event.event_type, EventType::Unknown);
    }

    #[test]
    fn test_malformed_body() {
        let source = GenericWebhook::new("hook");
        let err = source.handle(b"not json").unwrap_err();
        assert!(matches!(err, ContractError::SourcePayload { ref source_name, .. } if source_name == "hook"));
    }
}
