//! Sink implementations
//!
//! Contains LogSink, FileSink, and DiscordWebhookSink.

mod discord;
mod file;
mod log;

pub use self::discord::{validate_config as discord_validate, DiscordConfig, DiscordWebhookSink};
pub use self::file::{validate_config as file_validate, FileSink, FileSinkConfig};
pub use self::log::{validate_config as log_validate, LogLevel, LogSink, LogSinkConfig};
