//! Config validation
//!
//! Rules:
//! - field rules declared on `AppConfig` (`validator` derive)
//! - `log_level` is a filter directive list whose bare entries are levels
//! - source names unique
//! - sink names unique
//! - every adapter type registered and its payload accepted (`validate_adapters`)

use std::collections::HashSet;

use adapter_registry::{Registry, RegistryError};
use contracts::{AdapterConfig, AppConfig, ContractError};
use tracing_subscriber::filter::{Directive, LevelFilter};
use validator::Validate;

/// Validate an `AppConfig`, returning the first error found
pub fn validate(config: &AppConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation("config", e.to_string()))?;
    validate_log_level(&config.log_level)?;
    validate_unique_names("sources", &config.sources)?;
    validate_unique_names("sinks", &config.sinks)?;
    Ok(())
}

/// `info`, `warn,dispatcher=debug`, ...
///
/// A bare word parses as a target filter, which would silently mute every
/// other target, so entries without `=` or a span must name a level.
fn validate_log_level(log_level: &str) -> Result<(), ContractError> {
    let invalid = |reason: String| ContractError::config_validation("log_level", reason);

    if log_level.trim().is_empty() {
        return Err(invalid("must not be empty".to_string()));
    }
    for entry in log_level.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        entry
            .parse::<Directive>()
            .map_err(|e| invalid(format!("'{entry}': {e}")))?;
        if !entry.contains('=') && !entry.contains('[') {
            entry
                .parse::<LevelFilter>()
                .map_err(|_| invalid(format!("'{entry}' is not a log level")))?;
        }
    }
    Ok(())
}

fn validate_unique_names(list: &str, adapters: &[AdapterConfig]) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for adapter in adapters {
        if !seen.insert(adapter.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("{list}[name={}]", adapter.name),
                "duplicate name",
            ));
        }
    }
    Ok(())
}

/// Check every configured adapter against its registry
///
/// Unknown types and rejected payloads are reported before anything is
/// constructed.
pub fn validate_adapters<S, P>(
    config: &AppConfig,
    sinks: &Registry<S>,
    sources: &Registry<P>,
) -> Result<(), RegistryError> {
    sources.validate_all(&config.sources)?;
    sinks.validate_all(&config.sinks)?;
    Ok(())
}
