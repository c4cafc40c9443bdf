//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Event Model
//! - `Event` is an immutable value, cloned at each boundary
//! - `EventType` is closed; unrecognized types become `EventType::Unknown`

mod config;
mod error;
mod event;
mod sink;
mod source;

pub use config::*;
pub use error::*;
pub use event::*;
pub use sink::*;
pub use source::EventSource;
