//! # Integration Tests
//!
//! Cross-crate tests: source -> gateway -> dispatcher -> sinks.
//!
//! Covers:
//! - Wire shape of the normalized event
//! - Fan-out and per-sink failure isolation through the registry
//! - HTTP round trip against a live listener
//! - Config file to running pipeline

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use contracts::{ContractError, Event, EventSink, EventType};
    use dispatcher::{BoxedSink, SinkRegistry};

    pub type Received = Arc<Mutex<Vec<(String, Event)>>>;

    /// Records every event; when `accepts` is set, other types fail after
    /// being recorded
    pub struct RecordingSink {
        name: String,
        received: Received,
        accepts: Option<Vec<EventType>>,
    }

    impl EventSink for RecordingSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn process(&mut self, event: &Event) -> Result<(), ContractError> {
            self.received
                .lock()
                .unwrap()
                .push((self.name.clone(), event.clone()));
            match &self.accepts {
                Some(types) if !types.contains(&event.event_type) => {
                    Err(ContractError::unknown_event_type(&self.name, event.event_type))
                }
                _ => Ok(()),
            }
        }

        async fn shutdown(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    /// Built-in sinks plus `recording` (accepts all) and `narrow`
    /// (only `ObjectAdded`), both writing into `received`
    pub fn registry(received: &Received) -> SinkRegistry {
        let mut registry = dispatcher::default_sink_registry();

        let log = Arc::clone(received);
        registry.register(
            "recording",
            move |name, _config| {
                Ok(BoxedSink::new(RecordingSink {
                    name: name.to_string(),
                    received: Arc::clone(&log),
                    accepts: None,
                }))
            },
            None,
        );

        let log = Arc::clone(received);
        registry.register(
            "narrow",
            move |name, _config| {
                Ok(BoxedSink::new(RecordingSink {
                    name: name.to_string(),
                    received: Arc::clone(&log),
                    accepts: Some(vec![EventType::ObjectAdded]),
                }))
            },
            None,
        );

        registry
    }

    pub fn received_by(received: &Received, sink: &str) -> Vec<Event> {
        received
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == sink)
            .map(|(_, event)| event.clone())
            .collect()
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{Event, EventType, Metadata};
    use serde_json::json;

    #[test]
    fn test_event_wire_shape() {
        let mut metadata = Metadata::new();
        metadata.add_inline("Quality", "1080p");

        let event = Event::new(EventType::HealthIssue, "disk")
            .with_source("Sonarr", "Health", "")
            .with_metadata(metadata);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "health_issue");
        assert_eq!(value["source_event"], "Health");
        assert_eq!(
            value["metadata"],
            json!([{ "name": "Quality", "value": "1080p", "inline": true }])
        );
        assert!(value.get("link_url").is_none());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use config_loader::{validate_adapters, ConfigFormat, ConfigLoader};
    use contracts::{AdapterConfig, AppConfig, Event, EventSource, EventType};
    use dispatcher::{create_dispatcher, Dispatcher, DispatcherConfig};
    use gateway::SourceManager;
    use serde_json::json;
    use sources::{default_source_registry, GenericWebhook};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use crate::support::{received_by, registry, Received};

    fn new_received() -> Received {
        Arc::new(Mutex::new(Vec::new()))
    }

    /// `{log, discord}` scenario: both get the identical HealthIssue event,
    /// the sink without a mapping for it fails while the log sink succeeds
    #[tokio::test]
    async fn test_health_issue_fans_out_to_both_sinks() {
        let received = new_received();
        let sinks = registry(&received);

        let config = AppConfig {
            sinks: vec![
                AdapterConfig::new("log", "recording"),
                AdapterConfig::new("discord", "narrow"),
            ],
            ..Default::default()
        };
        let mut dispatcher = create_dispatcher(&config, &sinks).await.unwrap();
        let handles: HashMap<_, _> = dispatcher.metrics_handles().await.into_iter().collect();

        let event = Event::new(EventType::HealthIssue, "Sonarr Health warning: IndexerCheck")
            .with_description("No indexers available");
        dispatcher.enqueue_event(event.clone()).await.unwrap();
        dispatcher.stop().await.unwrap();

        assert_eq!(received_by(&received, "log"), vec![event.clone()]);
        assert_eq!(received_by(&received, "discord"), vec![event]);

        let log = handles["log"].snapshot();
        let discord = handles["discord"].snapshot();
        assert_eq!((log.delivered_count, log.failure_count), (1, 0));
        assert_eq!((discord.delivered_count, discord.failure_count), (0, 1));
    }

    #[tokio::test]
    async fn test_source_to_sinks_through_manager() {
        let received = new_received();
        let sinks = registry(&received);
        let config = AppConfig {
            sources: vec![AdapterConfig::new("sonarr", "sonarr")],
            sinks: vec![
                AdapterConfig::new("a", "recording"),
                AdapterConfig::new("b", "recording"),
            ],
            ..Default::default()
        };

        let mut dispatcher = create_dispatcher(&config, &sinks).await.unwrap();
        let manager = SourceManager::new(dispatcher.sender());
        manager
            .reconfigure_from(&default_source_registry(), &config.sources)
            .await
            .unwrap();

        let payloads = [
            json!({"eventType": "Test", "series": {"title": "Test Series"}}),
            json!({"eventType": "SeriesAdd", "series": {"title": "Dark", "year": 2017}}),
            json!({"eventType": "Health", "level": "error", "type": "DiskSpaceCheck", "message": "Low"}),
        ];
        for payload in &payloads {
            manager
                .ingest("sonarr", payload.to_string().as_bytes())
                .await
                .unwrap();
        }
        dispatcher.stop().await.unwrap();

        let types: Vec<EventType> = received_by(&received, "a")
            .iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(
            types,
            vec![EventType::Test, EventType::ObjectAdded, EventType::HealthIssue]
        );
        assert_eq!(received_by(&received, "a"), received_by(&received, "b"));
    }

    #[tokio::test]
    async fn test_reconfigure_from_registry_mid_stream() {
        let received = new_received();
        let sinks = registry(&received);

        let mut dispatcher = Dispatcher::new(DispatcherConfig::default());
        dispatcher.start().unwrap();
        dispatcher
            .reconfigure_from(&sinks, &[AdapterConfig::new("old", "recording")])
            .await
            .unwrap();
        dispatcher
            .enqueue_event(Event::new(EventType::Informational, "before"))
            .await
            .unwrap();
        // Ingress events go to whichever set is active when dequeued, so
        // wait for delivery before switching
        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while received_by(&received, "old").is_empty() {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        // Unknown type: rejected, running set untouched
        assert!(dispatcher
            .reconfigure_from(&sinks, &[AdapterConfig::new("x", "smoke-signal")])
            .await
            .is_err());
        assert_eq!(dispatcher.active_sinks().await, vec!["old"]);

        dispatcher
            .reconfigure_from(&sinks, &[AdapterConfig::new("new", "recording")])
            .await
            .unwrap();
        dispatcher
            .enqueue_event(Event::new(EventType::Informational, "after"))
            .await
            .unwrap();
        dispatcher.stop().await.unwrap();

        let titles = |sink: &str| -> Vec<String> {
            received_by(&received, sink)
                .into_iter()
                .map(|e| e.title)
                .collect()
        };
        assert_eq!(titles("old"), vec!["before"]);
        assert_eq!(titles("new"), vec!["after"]);
    }

    #[tokio::test]
    async fn test_http_round_trip() {
        let received = new_received();
        let sinks = registry(&received);
        let config = AppConfig {
            sinks: vec![AdapterConfig::new("rec", "recording")],
            ..Default::default()
        };

        let mut dispatcher = create_dispatcher(&config, &sinks).await.unwrap();
        let manager = Arc::new(SourceManager::new(dispatcher.sender()));
        let mut producers: HashMap<String, Arc<dyn EventSource>> = HashMap::new();
        producers.insert("hook".into(), Arc::new(GenericWebhook::new("hook")));
        manager.update_sources(producers).await;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(gateway::serve(listener, Arc::clone(&manager), async move {
            let _ = stop_rx.await;
        }));

        let client = reqwest::Client::new();
        let health = client.get(format!("{base}/healthz")).send().await.unwrap();
        assert_eq!(health.status(), 200);
        assert_eq!(health.text().await.unwrap(), "OK");

        let accepted = client
            .post(format!("{base}/webhook/hook"))
            .body(r#"{"type": "object_completed", "title": "Backup finished"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(accepted.status(), 202);

        let missing = client
            .post(format!("{base}/webhook/nobody"))
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);

        let malformed = client
            .post(format!("{base}/webhook/hook"))
            .body("not json")
            .send()
            .await
            .unwrap();
        assert!(!malformed.status().is_success());

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
        dispatcher.stop().await.unwrap();

        let events = received_by(&received, "rec");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::ObjectCompleted);
        assert_eq!(events[0].title, "Backup finished");
    }

    #[tokio::test]
    async fn test_config_file_to_running_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("events.jsonl");
        let toml = format!(
            r#"
queue_size = 8
sink_queue_size = 4

[[sources]]
name = "movies"
type = "radarr"

[sources.config]
url = "http://radarr:7878/"

[[sinks]]
name = "console"
type = "log"

[[sinks]]
name = "archive"
type = "file"

[sinks.config]
path = "{}"
"#,
            output.display()
        );

        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        let sinks = dispatcher::default_sink_registry();
        let sources = default_source_registry();
        validate_adapters(&config, &sinks, &sources).unwrap();

        let mut dispatcher = create_dispatcher(&config, &sinks).await.unwrap();
        assert_eq!(dispatcher.active_sinks().await, vec!["archive", "console"]);

        let manager = SourceManager::new(dispatcher.sender());
        manager.reconfigure_from(&sources, &config.sources).await.unwrap();

        let payload = json!({
            "eventType": "Download",
            "movie": {"title": "Heat", "year": 1995, "tmdbId": 949},
            "movieFile": {"quality": "Bluray-1080p", "size": 1024}
        });
        let event = manager
            .ingest("movies", payload.to_string().as_bytes())
            .await
            .unwrap();
        assert_eq!(event.link_url.as_deref(), Some("http://radarr:7878/movie/949"));
        dispatcher.stop().await.unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 1);
        let stored: Event = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(stored, event);
    }
}
