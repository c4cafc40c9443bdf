//! Pipeline orchestration module.

mod orchestrator;
mod signals;
mod stats;

pub use orchestrator::{reload_config, Pipeline, PipelineConfig};
pub use signals::shutdown_signal;
pub use stats::PipelineStats;
