//! # courier-api
//!
//! HTTP layer for Courier. Terminates signed interaction callbacks, answers the
//! platform, and relays actionable interactions to the downstream automation
//! endpoint.

pub mod forwarder;
pub mod middleware;
pub mod protocol;
pub mod routes;

use axum::{Router, response::IntoResponse};
use courier_common::error::CourierError;
use courier_signing::InteractionVerifier;
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use crate::forwarder::Forwarder;

/// Shared application state available to all route handlers.
///
/// Everything in here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Verifier for the application's public key.
    pub verifier: InteractionVerifier,
    /// Downstream relay. Forwards run on detached tasks owned by the forwarder.
    pub forwarder: Arc<Forwarder>,
    /// Upper bound on inbound bodies, enforced before the raw body is buffered.
    pub max_body_bytes: usize,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(verifier: InteractionVerifier, forwarder: Arc<Forwarder>, max_body_bytes: usize) -> Self {
        Self {
            verifier,
            forwarder,
            max_body_bytes,
            started_at: Instant::now(),
        }
    }
}

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.max_body_bytes;

    Router::new()
        .merge(routes::interactions::router())
        .merge(routes::health::router())
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(tower_http::limit::RequestBodyLimitLayer::new(max_body_bytes))
        .layer(tower_http::catch_panic::CatchPanicLayer::custom(handle_panic))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Turn a handler panic into the same JSON 500 every other internal fault gets.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    CourierError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}
