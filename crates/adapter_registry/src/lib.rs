//! # Adapter Registry
//!
//! Capability registry module.
//!
//! Responsibilities:
//! - Map an operator-facing type tag ("log", "radarr", ...) to a constructor
//!   and an optional config validator
//! - One generic design, instantiated once for sinks and once for sources
//! - Decode opaque adapter payloads into typed configs

pub mod error;
pub mod params;
pub mod registry;

pub use error::{RegistryError, Result};
pub use params::decode_params;
pub use registry::{Constructor, Registry, Validator};
