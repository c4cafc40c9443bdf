//! # Dispatcher
//!
//! Event fan-out.
//!
//! Responsibilities:
//! - Accept `Event`s on a bounded ingress queue
//! - Fan out to every active sink, each with its own queue and task
//! - Swap the sink set at runtime without losing accepted events
//! - Drain everything on stop

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod sinks;
pub mod worker;

pub use contracts::{Event, EventSink};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherConfig, EventSender};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use registry::{default_sink_registry, register_builtin_sinks, SinkRegistry};
pub use sinks::{DiscordWebhookSink, FileSink, LogSink};
pub use worker::{BoxedSink, SinkSender, SinkWorker, WorkerState};
