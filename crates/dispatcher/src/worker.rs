//! SinkWorker - one sink, one bounded queue, one task
//!
//! Lifecycle: `Created -> Running -> Draining -> Stopped`.
//!
//! Events are taken FIFO and handed to the sink one at a time. Shutdown
//! closes the queue, processes whatever was already accepted, then calls
//! the sink's `shutdown` hook exactly once.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use contracts::{Event, EventSink};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;

type WorkerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Observable worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Queue allocated, task not yet spawned
    Created = 0,
    Running = 1,
    /// Queue closed, buffered events still being processed
    Draining = 2,
    Stopped = 3,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Created,
            1 => WorkerState::Running,
            2 => WorkerState::Draining,
            _ => WorkerState::Stopped,
        }
    }
}

#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(WorkerState::Created as u8))
    }

    fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

enum WorkerTask {
    /// Held behind a mutex only so the worker stays `Sync`
    Created(Mutex<WorkerFuture>),
    Running(JoinHandle<()>),
}

/// A sink with its concrete type erased
///
/// Produced by the sink registry. The concrete type is only needed again
/// when the worker future is built, so erasure happens by capturing the
/// sink in that step.
pub struct BoxedSink {
    name: String,
    bind: Box<dyn FnOnce(String, usize) -> SinkWorker + Send>,
}

impl BoxedSink {
    pub fn new<S>(sink: S) -> Self
    where
        S: EventSink + Send + 'static,
    {
        Self {
            name: sink.name().to_string(),
            bind: Box::new(move |name, capacity| SinkWorker::new(name, sink, capacity)),
        }
    }

    /// The sink's own name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wrap the sink in a worker (state `Created`)
    pub fn into_worker(self, name: impl Into<String>, queue_capacity: usize) -> SinkWorker {
        (self.bind)(name.into(), queue_capacity)
    }
}

impl fmt::Debug for BoxedSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedSink").field("name", &self.name).finish()
    }
}

/// Cloneable enqueue handle for a worker's queue
#[derive(Clone)]
pub struct SinkSender {
    name: Arc<str>,
    tx: mpsc::Sender<Event>,
    metrics: Arc<SinkMetrics>,
    state: Arc<StateCell>,
}

impl SinkSender {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lifecycle state of the worker, still readable once it has been
    /// consumed by `shutdown`
    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// Enqueue an event, waiting for queue space
    ///
    /// # Errors
    /// `WorkerClosed` once the worker has started draining.
    pub async fn enqueue(&self, event: Event) -> Result<(), DispatcherError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| DispatcherError::worker_closed(self.name.as_ref()))?;

        self.metrics.inc_enqueued_count();
        let depth = self.tx.max_capacity() - self.tx.capacity();
        self.metrics.set_queue_len(depth);
        observability::record_sink_queue_depth(&self.name, depth);
        Ok(())
    }
}

/// Owns a sink, its queue and its task
pub struct SinkWorker {
    sender: SinkSender,
    shutdown_tx: oneshot::Sender<()>,
    task: Option<WorkerTask>,
}

impl SinkWorker {
    /// Allocate the queue and prepare the task; nothing runs until `start`
    pub fn new<S>(name: impl Into<String>, sink: S, queue_capacity: usize) -> Self
    where
        S: EventSink + Send + 'static,
    {
        let name: Arc<str> = Arc::from(name.into());
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let metrics = Arc::new(SinkMetrics::new());
        let state = Arc::new(StateCell::new());

        let future = Box::pin(worker_loop(
            Arc::clone(&name),
            sink,
            rx,
            shutdown_rx,
            Arc::clone(&metrics),
            Arc::clone(&state),
        ));

        Self {
            sender: SinkSender {
                name,
                tx,
                metrics,
                state,
            },
            shutdown_tx,
            task: Some(WorkerTask::Created(Mutex::new(future))),
        }
    }

    /// Create and start in one step, named after the sink
    pub fn spawn<S>(sink: S, queue_capacity: usize) -> Self
    where
        S: EventSink + Send + 'static,
    {
        let name = sink.name().to_string();
        let mut worker = Self::new(name, sink, queue_capacity);
        worker.start();
        worker
    }

    /// Spawn the worker task; no-op if already running
    pub fn start(&mut self) {
        match self.task.take() {
            Some(WorkerTask::Created(future)) => {
                self.sender.state.set(WorkerState::Running);
                self.task = Some(WorkerTask::Running(tokio::spawn(future.into_inner())));
            }
            other => self.task = other,
        }
    }

    pub fn name(&self) -> &str {
        self.sender.name()
    }

    pub fn state(&self) -> WorkerState {
        self.sender.state()
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.sender.metrics
    }

    /// Shared counters that outlive the worker
    pub fn metrics_handle(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.sender.metrics)
    }

    /// A handle for enqueueing without holding the worker
    pub fn sender(&self) -> SinkSender {
        self.sender.clone()
    }

    /// Enqueue an event, waiting for queue space (never drops)
    pub async fn enqueue(&self, event: Event) -> Result<(), DispatcherError> {
        self.sender.enqueue(event).await
    }

    /// Drain and stop
    ///
    /// Returns once every accepted event has been processed and the sink's
    /// shutdown hook has run. A worker that was never started runs its loop
    /// inline so the hook still fires.
    #[instrument(name = "sink_worker_shutdown", skip(self), fields(sink = %self.sender.name))]
    pub async fn shutdown(self) {
        let SinkWorker {
            sender,
            shutdown_tx,
            task,
            ..
        } = self;

        let _ = shutdown_tx.send(());
        drop(sender);

        match task {
            Some(WorkerTask::Created(future)) => future.into_inner().await,
            Some(WorkerTask::Running(handle)) => {
                if let Err(e) = handle.await {
                    error!(error = %e, "Sink worker task panicked");
                }
            }
            None => {}
        }
    }
}

impl fmt::Debug for SinkWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkWorker")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

async fn worker_loop<S>(
    name: Arc<str>,
    mut sink: S,
    mut rx: mpsc::Receiver<Event>,
    mut shutdown_rx: oneshot::Receiver<()>,
    metrics: Arc<SinkMetrics>,
    state: Arc<StateCell>,
) where
    S: EventSink + Send,
{
    state.set(WorkerState::Running);
    debug!(sink = %name, "Sink worker started");

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => process_event(&name, &mut sink, &event, &metrics, rx.len()).await,
                None => break,
            },
            _ = &mut shutdown_rx => break,
        }
    }

    state.set(WorkerState::Draining);
    rx.close();

    let mut drained: u64 = 0;
    while let Some(event) = rx.recv().await {
        process_event(&name, &mut sink, &event, &metrics, rx.len()).await;
        drained += 1;
    }

    if let Err(e) = sink.shutdown().await {
        warn!(sink = %name, error = %e, "Sink shutdown reported an error");
    }

    state.set(WorkerState::Stopped);
    info!(
        sink = %name,
        drained,
        delivered = metrics.delivered_count(),
        failures = metrics.failure_count(),
        "Sink worker stopped"
    );
}

async fn process_event<S>(
    name: &str,
    sink: &mut S,
    event: &Event,
    metrics: &SinkMetrics,
    remaining: usize,
) where
    S: EventSink + Send,
{
    metrics.set_queue_len(remaining);
    observability::record_sink_queue_depth(name, remaining);

    match sink.process(event).await {
        Ok(()) => {
            metrics.inc_delivered_count();
            observability::record_event_processed(name, true);
        }
        Err(e) => {
            metrics.inc_failure_count();
            observability::record_event_processed(name, false);
            error!(
                sink = %name,
                event_type = %event.event_type,
                title = %event.title,
                error = %e,
                "Event processing failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, EventType};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records titles; fails on `ObjectFailed` events
    struct RecordingSink {
        name: String,
        seen: Arc<Mutex<Vec<String>>>,
        shutdowns: Arc<AtomicUsize>,
    }

    impl EventSink for RecordingSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn process(&mut self, event: &Event) -> Result<(), ContractError> {
            if event.event_type == EventType::ObjectFailed {
                return Err(ContractError::sink_write(&self.name, "rejected"));
            }
            self.seen.lock().unwrap().push(event.title.clone());
            Ok(())
        }

        async fn shutdown(&mut self) -> Result<(), ContractError> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn recording(name: &str) -> (RecordingSink, Arc<Mutex<Vec<String>>>, Arc<AtomicUsize>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let shutdowns = Arc::new(AtomicUsize::new(0));
        let sink = RecordingSink {
            name: name.to_string(),
            seen: Arc::clone(&seen),
            shutdowns: Arc::clone(&shutdowns),
        };
        (sink, seen, shutdowns)
    }

    fn event(title: &str) -> Event {
        Event::new(EventType::Informational, title)
    }

    #[tokio::test]
    async fn test_fifo_and_drain_on_shutdown() {
        let (sink, seen, shutdowns) = recording("rec");
        let worker = SinkWorker::spawn(sink, 16);
        assert_eq!(worker.state(), WorkerState::Running);

        for i in 0..10 {
            worker.enqueue(event(&format!("e{i}"))).await.unwrap();
        }
        worker.shutdown().await;

        let expected: Vec<String> = (0..10).map(|i| format!("e{i}")).collect();
        assert_eq!(*seen.lock().unwrap(), expected);
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_worker() {
        let (sink, seen, _) = recording("rec");
        let worker = SinkWorker::spawn(sink, 4);

        worker.enqueue(event("before")).await.unwrap();
        worker
            .enqueue(Event::new(EventType::ObjectFailed, "bad"))
            .await
            .unwrap();
        worker.enqueue(event("after")).await.unwrap();

        let sender = worker.sender();
        let metrics = Arc::clone(&sender.metrics);
        worker.shutdown().await;

        assert_eq!(*seen.lock().unwrap(), vec!["before", "after"]);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.delivered_count, 2);
        assert_eq!(snapshot.failure_count, 1);
        assert_eq!(snapshot.processed_count(), 3);
    }

    #[tokio::test]
    async fn test_created_worker_runs_hook_on_shutdown() {
        let (sink, seen, shutdowns) = recording("idle");
        let worker = SinkWorker::new("idle", sink, 4);
        assert_eq!(worker.state(), WorkerState::Created);

        // Accepted before start, still processed during the drain
        worker.enqueue(event("queued")).await.unwrap();
        worker.shutdown().await;

        assert_eq!(*seen.lock().unwrap(), vec!["queued"]);
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_state_observable_through_sender() {
        let (sink, seen, _) = recording("rec");
        let worker = SinkWorker::new("rec", sink, 4);
        let sender = worker.sender();
        assert_eq!(sender.state(), WorkerState::Created);

        let mut worker = worker;
        worker.start();
        assert_eq!(sender.state(), WorkerState::Running);

        sender.enqueue(event("last")).await.unwrap();
        worker.shutdown().await;

        assert_eq!(sender.state(), WorkerState::Stopped);
        assert_eq!(*seen.lock().unwrap(), vec!["last"]);
    }

    #[tokio::test]
    async fn test_sender_rejected_after_shutdown() {
        let (sink, _, _) = recording("gone");
        let worker = SinkWorker::spawn(sink, 4);
        let sender = worker.sender();

        worker.shutdown().await;

        let err = sender.enqueue(event("late")).await.unwrap_err();
        assert!(matches!(err, DispatcherError::WorkerClosed { ref sink_name } if sink_name == "gone"));
    }

    #[tokio::test]
    async fn test_boxed_sink_keeps_configured_name() {
        let (sink, seen, _) = recording("inner");
        let boxed = BoxedSink::new(sink);
        assert_eq!(boxed.name(), "inner");

        let mut worker = boxed.into_worker("alerts", 2);
        assert_eq!(worker.name(), "alerts");
        worker.start();
        worker.enqueue(event("x")).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), worker.shutdown())
            .await
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
