//! Health check endpoints, for load balancers, monitoring, and Docker health checks.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Plain-text body served at `/`.
pub const ROOT_BODY: &str = "Discord bridge OK";

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    /// `enabled` when a downstream URL is configured.
    forwarding: &'static str,
    inflight_forwards: usize,
}

/// Health check router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

async fn root() -> &'static str {
    ROOT_BODY
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        forwarding: if state.forwarder.is_configured() {
            "enabled"
        } else {
            "disabled"
        },
        inflight_forwards: state.forwarder.inflight(),
    })
}
