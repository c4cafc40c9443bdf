//! # Sources
//!
//! Event producers: turn an inbound webhook body into an `Event`.
//!
//! Built-in types:
//! - `generic-webhook`: the body already is an `Event` in JSON
//! - `radarr`: Radarr webhook payloads
//! - `sonarr`: Sonarr webhook payloads
//!
//! Producers are stateless and synchronous; the front-end hands their
//! result to the dispatcher.

pub mod generic_webhook;
pub mod radarr;
pub mod registry;
pub mod sonarr;
mod starr;

pub use contracts::EventSource;
pub use generic_webhook::GenericWebhook;
pub use radarr::Radarr;
pub use registry::{default_source_registry, register_builtin_sources, SourceRegistry};
pub use sonarr::Sonarr;
pub use starr::StarrConfig;
