//! EventSource trait - inbound producer interface

use crate::{ContractError, Event};

/// Event producer
///
/// Converts the body of one inbound request into a normalized [`Event`].
/// Shared across concurrently served requests, so it takes `&self`.
pub trait EventSource: Send + Sync {
    /// Producer type name (used for logging/metrics)
    fn kind(&self) -> &str;

    /// Parse an inbound request body
    ///
    /// # Errors
    /// Returns [`ContractError::SourcePayload`] when the body cannot be
    /// mapped to an event.
    fn handle(&self, body: &[u8]) -> Result<Event, ContractError>;
}
