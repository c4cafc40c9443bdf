//! Registry error types

use contracts::ContractError;
use thiserror::Error;

/// Registry specific error
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Configuration referenced a type this build does not provide
    #[error("{kind} type '{type_name}' is not registered")]
    UnknownType {
        kind: &'static str,
        type_name: String,
    },

    /// Registered validator rejected the payload
    #[error("invalid config for {kind} type '{type_name}': {source}")]
    InvalidConfig {
        kind: &'static str,
        type_name: String,
        #[source]
        source: ContractError,
    },

    /// Constructor failed to build the instance
    #[error("failed to create {kind} '{name}' of type '{type_name}': {source}")]
    Construction {
        kind: &'static str,
        name: String,
        type_name: String,
        #[source]
        source: ContractError,
    },
}

impl RegistryError {
    /// Create unknown type error
    pub fn unknown_type(kind: &'static str, type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            kind,
            type_name: type_name.into(),
        }
    }

    /// Type tag the error refers to
    pub fn type_name(&self) -> &str {
        match self {
            Self::UnknownType { type_name, .. }
            | Self::InvalidConfig { type_name, .. }
            | Self::Construction { type_name, .. } => type_name,
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, RegistryError>;
