//! Gateway error types

use adapter_registry::RegistryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::ContractError;
use dispatcher::DispatcherError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// No producer configured under this name
    #[error("source not found")]
    SourceNotFound { source_name: String },

    /// Producer could not turn the request into an event
    #[error("{0}")]
    Source(#[source] ContractError),

    /// Event could not be handed to the dispatcher
    #[error(transparent)]
    Dispatch(#[from] DispatcherError),

    /// Producer lookup / validation / construction failure
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl GatewayError {
    pub fn source_not_found(source_name: impl Into<String>) -> Self {
        Self::SourceNotFound {
            source_name: source_name.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::SourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Source(_) | Self::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Dispatch(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "code": status.as_u16(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
