//! EventSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for delivery destinations.

use crate::{ContractError, Event};

/// Delivery destination
///
/// All sink implementations must implement this trait. A worker calls
/// `process` once per accepted event, strictly one at a time, and `shutdown`
/// exactly once after the last event.
#[trait_variant::make(EventSink: Send)]
pub trait LocalEventSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Turn one event into its side effect
    ///
    /// # Errors
    /// Returns the failure for this event only; an event type the sink has
    /// no handling for must be reported as [`ContractError::UnknownEventType`].
    async fn process(&mut self, event: &Event) -> Result<(), ContractError>;

    /// Release resources; returns once they are released
    async fn shutdown(&mut self) -> Result<(), ContractError>;
}
