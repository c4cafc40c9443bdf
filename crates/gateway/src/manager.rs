//! SourceManager - live name -> producer map

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{AdapterConfig, Event, EventSource};
use dispatcher::EventSender;
use sources::SourceRegistry;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::error::GatewayError;

/// Routes inbound payloads to the producer named in the request
///
/// The producer set can be replaced while requests are in flight; a
/// request uses whichever producer was registered when it arrived.
pub struct SourceManager {
    sources: RwLock<HashMap<String, Arc<dyn EventSource>>>,
    events: EventSender,
}

impl SourceManager {
    pub fn new(events: EventSender) -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Replace the producer set: names not in `sources` are dropped
    #[instrument(name = "source_manager_update", skip_all, fields(source_count = sources.len()))]
    pub async fn update_sources(&self, sources: HashMap<String, Arc<dyn EventSource>>) {
        let mut active = self.sources.write().await;
        active.retain(|name, _| {
            let keep = sources.contains_key(name);
            if !keep {
                info!(source = %name, "Source removed");
            }
            keep
        });
        for (name, source) in sources {
            info!(source = %name, kind = source.kind(), "Source registered");
            active.insert(name, source);
        }
    }

    /// Validate and build every configured producer, then `update_sources`
    ///
    /// Nothing changes if any entry fails.
    pub async fn reconfigure_from(
        &self,
        registry: &SourceRegistry,
        configs: &[AdapterConfig],
    ) -> Result<(), GatewayError> {
        let built = registry.create_all(configs)?;
        self.update_sources(built.into_iter().collect()).await;
        Ok(())
    }

    /// Names of the configured producers, sorted
    pub async fn source_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.read().await.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Turn a payload into an event and hand it to the dispatcher
    ///
    /// # Errors
    /// - `SourceNotFound` if no producer is registered under `slug`
    /// - `Source` if the producer rejects the payload
    /// - `Dispatch` if the dispatcher no longer accepts events
    #[instrument(name = "source_manager_ingest", skip(self, body), fields(source = %slug, bytes = body.len()))]
    pub async fn ingest(&self, slug: &str, body: &[u8]) -> Result<Event, GatewayError> {
        let source = self
            .sources
            .read()
            .await
            .get(slug)
            .cloned()
            .ok_or_else(|| GatewayError::source_not_found(slug))?;

        let event = match source.handle(body) {
            Ok(event) => event,
            Err(e) => {
                warn!(source = %slug, error = %e, "Source rejected payload");
                observability::record_event_rejected(slug);
                return Err(GatewayError::Source(e));
            }
        };

        observability::record_event_received(slug, event.event_type);
        self.events.enqueue_event(event.clone()).await?;
        Ok(event)
    }
}
