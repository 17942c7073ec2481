//! Interaction response protocol.
//!
//! ```text
//! Received ─► Verifying ─┬─► Rejected                       (401, terminal)
//!                        └─► Classifying ─┬─► HandshakeAnswered   (PONG, terminal)
//!                                         └─► ActionableAnswered  (deferred ack, terminal)
//!                                               + ForwardScheduled (detached)
//! ```
//!
//! Actionable interactions use the deferred strategy: the platform gets
//! `DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE` immediately and the downstream system
//! posts the real reply later with the interaction token. The reply never
//! waits on the downstream call, so the platform's response deadline is always
//! met.

use courier_common::models::{Interaction, InteractionKind, InteractionResponse, InteractionType};

/// Where a request is in the protocol. Used for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Received,
    Verifying,
    Rejected,
    Classifying,
    HandshakeAnswered,
    ActionableAnswered,
    ForwardScheduled,
}

impl BridgeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Verifying => "verifying",
            Self::Rejected => "rejected",
            Self::Classifying => "classifying",
            Self::HandshakeAnswered => "handshake_answered",
            Self::ActionableAnswered => "actionable_answered",
            Self::ForwardScheduled => "forward_scheduled",
        }
    }
}

/// `type == 1` is a handshake; anything else, including a missing or
/// non-integer `type`, is actionable and goes downstream.
pub fn classify(interaction: &Interaction) -> InteractionKind {
    match interaction.interaction_type() {
        InteractionType::Ping => InteractionKind::Handshake,
        _ => InteractionKind::Actionable,
    }
}

/// The one reply the platform gets for an interaction of this kind.
pub fn compose(kind: InteractionKind) -> InteractionResponse {
    match kind {
        InteractionKind::Handshake => InteractionResponse::pong(),
        InteractionKind::Actionable => InteractionResponse::deferred(),
    }
}

/// Terminal state reached after answering an interaction of this kind.
pub fn answered_state(kind: InteractionKind) -> BridgeState {
    match kind {
        InteractionKind::Handshake => BridgeState::HandshakeAnswered,
        InteractionKind::Actionable => BridgeState::ActionableAnswered,
    }
}
