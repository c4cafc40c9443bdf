//! # Gateway
//!
//! HTTP routing front-end.
//!
//! `POST /webhook/{source}` looks up the producer configured under
//! `source`, turns the body into an `Event` and enqueues it on the
//! dispatcher. `GET /healthz` answers `OK`.

pub mod error;
pub mod manager;
pub mod server;

pub use error::GatewayError;
pub use manager::SourceManager;
pub use server::{router, serve, MAX_BODY_BYTES};
