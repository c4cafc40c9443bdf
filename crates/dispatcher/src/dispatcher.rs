//! Dispatcher - ingress queue, dispatch loop and the live sink set

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use contracts::{AdapterConfig, AppConfig, Event};
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::registry::SinkRegistry;
use crate::worker::{BoxedSink, SinkSender, SinkWorker};

/// Active workers keyed by name; iteration order is the fan-out order
type SinkMap = BTreeMap<String, SinkWorker>;

/// Dispatcher configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Ingress queue capacity
    pub queue_capacity: usize,
    /// Per-sink queue capacity
    pub sink_queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            sink_queue_capacity: 100,
        }
    }
}

impl DispatcherConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            queue_capacity: config.queue_size,
            sink_queue_capacity: config.sink_queue_size,
        }
    }
}

/// Cloneable ingress handle handed to front-ends
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    /// Submit an event, waiting for ingress space
    ///
    /// # Errors
    /// `Closed` once the dispatcher has stopped.
    pub async fn enqueue_event(&self, event: Event) -> Result<(), DispatcherError> {
        self.tx.send(event).await.map_err(|_| DispatcherError::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Running,
    Stopped,
}

/// Fans every ingress event out to all active sinks
///
/// Created once, started once, reconfigured any number of times and
/// stopped exactly once.
pub struct Dispatcher {
    config: DispatcherConfig,
    ingress_tx: mpsc::Sender<Event>,
    ingress_rx: Option<mpsc::Receiver<Event>>,
    sinks: Arc<RwLock<SinkMap>>,
    /// Shutdowns of sinks removed or replaced by `reconfigure`
    retiring: Mutex<JoinSet<()>>,
    shutdown_tx: watch::Sender<bool>,
    loop_handle: Option<JoinHandle<()>>,
    lifecycle: Lifecycle,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        let (ingress_tx, ingress_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            ingress_tx,
            ingress_rx: Some(ingress_rx),
            sinks: Arc::new(RwLock::new(SinkMap::new())),
            retiring: Mutex::new(JoinSet::new()),
            shutdown_tx,
            loop_handle: None,
            lifecycle: Lifecycle::Created,
        }
    }

    pub fn config(&self) -> DispatcherConfig {
        self.config
    }

    /// Ingress handle for front-ends
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.ingress_tx.clone(),
        }
    }

    /// Submit an event, waiting for ingress space
    pub async fn enqueue_event(&self, event: Event) -> Result<(), DispatcherError> {
        self.ingress_tx
            .send(event)
            .await
            .map_err(|_| DispatcherError::Closed)
    }

    /// Spawn the dispatch loop and return
    #[instrument(name = "dispatcher_start", skip(self))]
    pub fn start(&mut self) -> Result<(), DispatcherError> {
        match self.lifecycle {
            Lifecycle::Running => return Err(DispatcherError::AlreadyStarted),
            Lifecycle::Stopped => return Err(DispatcherError::AlreadyStopped),
            Lifecycle::Created => {}
        }
        let rx = self.ingress_rx.take().ok_or(DispatcherError::AlreadyStarted)?;

        let sinks = Arc::clone(&self.sinks);
        let shutdown_rx = self.shutdown_tx.subscribe();
        self.loop_handle = Some(tokio::spawn(dispatch_loop(rx, sinks, shutdown_rx)));
        self.lifecycle = Lifecycle::Running;
        Ok(())
    }

    /// Replace the active sink set
    ///
    /// Names absent from `new_sinks` are retired, names present are
    /// (re)created and started immediately. A same-name replacement retires
    /// the old instance in the background, so for a short window both may
    /// receive events.
    #[instrument(
        name = "dispatcher_reconfigure",
        skip(self, new_sinks),
        fields(sink_count = new_sinks.len())
    )]
    pub async fn reconfigure(&self, new_sinks: Vec<(String, BoxedSink)>) -> Result<(), DispatcherError> {
        if self.lifecycle == Lifecycle::Stopped {
            return Err(DispatcherError::AlreadyStopped);
        }

        let mut retired = Vec::new();
        {
            let mut active = self.sinks.write().await;

            let keep: HashSet<&str> = new_sinks.iter().map(|(name, _)| name.as_str()).collect();
            let removed: Vec<String> = active
                .keys()
                .filter(|name| !keep.contains(name.as_str()))
                .cloned()
                .collect();
            for name in removed {
                if let Some(worker) = active.remove(&name) {
                    info!(sink = %name, "Sink removed");
                    retired.push(worker);
                }
            }

            for (name, sink) in new_sinks {
                let mut worker = sink.into_worker(name.clone(), self.config.sink_queue_capacity);
                worker.start();
                if let Some(old) = active.insert(name.clone(), worker) {
                    info!(sink = %name, "Sink replaced");
                    retired.push(old);
                } else {
                    info!(sink = %name, "Sink added");
                }
            }

            observability::record_active_sinks(active.len());
        }

        let mut retiring = self.retiring.lock().await;
        while let Some(result) = retiring.try_join_next() {
            if let Err(e) = result {
                error!(error = %e, "Retired sink shutdown panicked");
            }
        }
        if !retired.is_empty() {
            for worker in retired {
                observability::record_sink_retired(worker.name());
                retiring.spawn(worker.shutdown());
            }
        }

        Ok(())
    }

    /// Validate and build every configured sink, then `reconfigure`
    ///
    /// Nothing changes if any entry fails validation or construction.
    #[instrument(name = "dispatcher_reconfigure_from", skip_all, fields(sink_count = configs.len()))]
    pub async fn reconfigure_from(
        &self,
        registry: &SinkRegistry,
        configs: &[AdapterConfig],
    ) -> Result<(), DispatcherError> {
        let sinks = registry.create_all(configs)?;
        self.reconfigure(sinks).await
    }

    /// Stop accepting events, drain everything, shut every sink down
    ///
    /// Returns after every event accepted on the ingress queue has been
    /// fanned out and every sink (active or retired) has run its shutdown
    /// hook.
    #[instrument(name = "dispatcher_stop", skip(self))]
    pub async fn stop(&mut self) -> Result<(), DispatcherError> {
        if self.lifecycle == Lifecycle::Stopped {
            return Err(DispatcherError::AlreadyStopped);
        }
        self.lifecycle = Lifecycle::Stopped;
        self.shutdown_tx.send_replace(true);

        if let Some(handle) = self.loop_handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Dispatch loop panicked");
            }
        } else if let Some(rx) = self.ingress_rx.take() {
            // Never started: run the loop inline, it sees the signal and drains
            dispatch_loop(rx, Arc::clone(&self.sinks), self.shutdown_tx.subscribe()).await;
        }

        let mut retiring = self.retiring.lock().await;
        while let Some(result) = retiring.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Retired sink shutdown panicked");
            }
        }

        info!("Dispatcher stopped");
        Ok(())
    }

    /// Names of the active sinks, sorted
    pub async fn active_sinks(&self) -> Vec<String> {
        self.sinks.read().await.keys().cloned().collect()
    }

    /// Metrics for all active sinks
    pub async fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.sinks
            .read()
            .await
            .iter()
            .map(|(name, worker)| (name.clone(), worker.metrics().snapshot()))
            .collect()
    }

    /// Live counters for all active sinks, readable after `stop`
    pub async fn metrics_handles(&self) -> Vec<(String, Arc<SinkMetrics>)> {
        self.sinks
            .read()
            .await
            .iter()
            .map(|(name, worker)| (name.clone(), worker.metrics_handle()))
            .collect()
    }
}

/// Build and start a dispatcher with the configured sinks
#[instrument(name = "dispatcher_create", skip_all)]
pub async fn create_dispatcher(
    config: &AppConfig,
    registry: &SinkRegistry,
) -> Result<Dispatcher, DispatcherError> {
    let mut dispatcher = Dispatcher::new(DispatcherConfig::from_app_config(config));
    dispatcher.reconfigure_from(registry, &config.sinks).await?;
    dispatcher.start()?;
    Ok(dispatcher)
}

async fn dispatch_loop(
    mut rx: mpsc::Receiver<Event>,
    sinks: Arc<RwLock<SinkMap>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!("Dispatcher started");

    let mut event_count: u64 = 0;
    loop {
        tokio::select! {
            biased;
            // The watch guard must not outlive this arm
            _ = async { let _ = shutdown_rx.wait_for(|stop| *stop).await; } => break,
            event = rx.recv() => match event {
                Some(event) => {
                    event_count += 1;
                    fan_out(&sinks, event).await;
                    if event_count.is_multiple_of(100) {
                        debug!(events = event_count, "Dispatcher progress");
                    }
                }
                None => break,
            },
        }
    }

    rx.close();
    let mut drained: u64 = 0;
    while let Some(event) = rx.recv().await {
        fan_out(&sinks, event).await;
        drained += 1;
    }
    drop(rx);

    info!(
        events = event_count + drained,
        drained, "Dispatcher ingress closed, shutting down sinks"
    );

    shutdown_workers(&sinks).await;
}

/// Deliver one event to a snapshot of the active sinks, in name order
///
/// The lock is released before enqueueing, so a full sink queue never
/// blocks `reconfigure`.
async fn fan_out(sinks: &RwLock<SinkMap>, event: Event) {
    let targets: Vec<SinkSender> = sinks.read().await.values().map(SinkWorker::sender).collect();

    if targets.is_empty() {
        warn!(event_type = %event.event_type, title = %event.title, "No active sinks, event discarded");
        return;
    }

    for target in targets {
        if let Err(e) = target.enqueue(event.clone()).await {
            debug!(sink = %target.name(), error = %e, "Skipping retired sink");
        }
    }
}

async fn shutdown_workers(sinks: &RwLock<SinkMap>) {
    let workers = std::mem::take(&mut *sinks.write().await);
    observability::record_active_sinks(0);

    let mut shutdowns = JoinSet::new();
    for (_, worker) in workers {
        shutdowns.spawn(worker.shutdown());
    }
    while let Some(result) = shutdowns.join_next().await {
        if let Err(e) = result {
            error!(error = %e, "Sink shutdown panicked");
        }
    }
}
