//! HTTP surface: liveness and relay status.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use courier_forward::Forwarder;
use serde_json::json;
use tracing::error;

/// Liveness response body.
pub const LIVENESS_TEXT: &str = "Relay is running";

/// API state shared by the handlers.
#[derive(Debug, Clone)]
pub struct ApiState {
    forwarder: Forwarder,
}

impl ApiState {
    /// Creates new API state.
    pub fn new(forwarder: Forwarder) -> Self {
        Self { forwarder }
    }
}

/// Creates the router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(liveness))
        .route("/status", get(status))
        .with_state(state)
}

/// Always healthy once the process is serving.
async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

/// Current relay status as JSON.
async fn status(State(state): State<ApiState>) -> Response {
    match state.forwarder.snapshot().await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => {
            error!(error = %e, "Status snapshot failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
