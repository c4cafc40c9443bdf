//! Dispatcher error types

use adapter_registry::RegistryError;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// `start` called more than once
    #[error("dispatcher already started")]
    AlreadyStarted,

    /// Operation on a dispatcher that has been stopped
    #[error("dispatcher already stopped")]
    AlreadyStopped,

    /// Ingress queue no longer accepts events
    #[error("dispatcher ingress closed")]
    Closed,

    /// Sink worker is draining or stopped and refuses new events
    #[error("sink '{sink_name}' no longer accepts events")]
    WorkerClosed { sink_name: String },

    /// Sink lookup / validation / construction failure
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl DispatcherError {
    /// Create a worker closed error
    pub fn worker_closed(sink_name: impl Into<String>) -> Self {
        Self::WorkerClosed {
            sink_name: sink_name.into(),
        }
    }
}
