//! Interaction endpoint: the platform's signed callbacks land here.
//!
//! `POST /interactions` (and `/discord/interactions` for existing app configs)
//!
//! 1. Verify `X-Signature-Ed25519` over `X-Signature-Timestamp || raw body`.
//! 2. Parse and classify the interaction.
//! 3. Answer: PONG for handshakes, deferred ack for everything else.
//! 4. Actionable interactions are relayed downstream on a detached task that
//!    the reply does not wait for.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware,
    routing::post,
    Json, Router,
};
use courier_common::{
    error::{CourierError, CourierResult},
    models::{Interaction, InteractionKind, InteractionResponse},
};
use courier_signing::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use std::sync::Arc;

use crate::{
    middleware::RawBody,
    protocol::{self, BridgeState},
    AppState,
};

/// Interaction routes. Each gets the raw body captured before anything parses it.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/interactions", post(handle_interaction))
        .route("/discord/interactions", post(handle_interaction))
        .route_layer(middleware::from_fn(crate::middleware::capture_raw_body))
}

/// POST /interactions
async fn handle_interaction(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> CourierResult<Json<InteractionResponse>> {
    let (parts, _body) = request.into_parts();
    tracing::trace!(state = BridgeState::Received.as_str(), "Interaction received");

    let raw = parts.extensions.get::<RawBody>().map(|r| r.0.clone());
    let signature = header_str(&parts.headers, SIGNATURE_HEADER);
    let timestamp = header_str(&parts.headers, TIMESTAMP_HEADER);

    tracing::trace!(state = BridgeState::Verifying.as_str());
    let verified = state.verifier.verify(raw.as_deref(), signature, timestamp);
    let raw = match raw {
        Some(raw) if verified => raw,
        _ => {
            tracing::warn!(
                state = BridgeState::Rejected.as_str(),
                has_signature = signature.is_some(),
                has_timestamp = timestamp.is_some(),
                "Invalid interaction request signature"
            );
            return Err(CourierError::InvalidSignature);
        }
    };

    tracing::trace!(state = BridgeState::Classifying.as_str());
    let interaction = Interaction::parse(raw).inspect_err(|e| {
        tracing::warn!("Verified interaction has an unusable body: {e}");
    })?;
    let kind = protocol::classify(&interaction);
    let response = protocol::compose(kind);

    tracing::info!(
        state = protocol::answered_state(kind).as_str(),
        interaction_id = interaction.id().unwrap_or("-"),
        interaction_type = interaction.interaction_type().as_str(),
        command = interaction.command_name().unwrap_or("-"),
        "Interaction answered"
    );

    if kind == InteractionKind::Actionable {
        // Detached: the reply below goes out regardless of how this ends.
        state.forwarder.spawn(interaction);
        tracing::debug!(state = BridgeState::ForwardScheduled.as_str());
    }

    Ok(Json(response))
}

// ============================================================================
// Helpers
// ============================================================================

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
