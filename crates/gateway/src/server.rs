//! HTTP front-end: routes, body logging, graceful serve

use std::future::Future;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::GatewayError;
use crate::manager::SourceManager;

/// Largest request body accepted, in bytes
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Build the router
///
/// - `GET /healthz` -> `OK`
/// - `POST /webhook/{source}` -> producer named `source`
pub fn router(state: Arc<SourceManager>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/webhook/{source}", post(ingest_webhook))
        .layer(middleware::from_fn(log_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves, then finish in-flight requests
pub async fn serve<F>(listener: TcpListener, state: Arc<SourceManager>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn ingest_webhook(
    State(manager): State<Arc<SourceManager>>,
    Path(source): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayError> {
    let event = manager.ingest(&source, &body).await?;
    debug!(source = %source, event_type = %event.event_type, title = %event.title, "Event accepted");
    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))))
}

/// Log request bodies at debug level, compacting JSON when possible
async fn log_body(request: Request, next: Next) -> Response {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "Request body unreadable");
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    if !bytes.is_empty() {
        let rendered = serde_json::from_slice::<serde_json::Value>(&bytes)
            .map(|value| value.to_string())
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
        debug!(method = %parts.method, uri = %parts.uri, body = %rendered, "Request body");
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
