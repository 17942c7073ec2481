//! Interaction & interaction response models.

use axum::body::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::error::CourierError;

/// Interaction type code sent by the platform in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    MessageComponent,
    ApplicationCommandAutocomplete,
    ModalSubmit,
    /// An integer code this bridge has no name for.
    Unknown(i64),
    /// `type` is absent, null, or not an integer.
    Missing,
}

impl InteractionType {
    pub const PING: i64 = 1;

    pub fn from_code(code: i64) -> Self {
        match code {
            Self::PING => Self::Ping,
            2 => Self::ApplicationCommand,
            3 => Self::MessageComponent,
            4 => Self::ApplicationCommandAutocomplete,
            5 => Self::ModalSubmit,
            other => Self::Unknown(other),
        }
    }

    /// Read the discriminant from a parsed payload.
    pub fn from_payload(payload: &Value) -> Self {
        payload
            .get("type")
            .and_then(Value::as_i64)
            .map_or(Self::Missing, Self::from_code)
    }

    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ping => "PING",
            Self::ApplicationCommand => "APPLICATION_COMMAND",
            Self::MessageComponent => "MESSAGE_COMPONENT",
            Self::ApplicationCommandAutocomplete => "APPLICATION_COMMAND_AUTOCOMPLETE",
            Self::ModalSubmit => "MODAL_SUBMIT",
            Self::Unknown(_) => "UNKNOWN",
            Self::Missing => "MISSING",
        }
    }
}

/// How the bridge treats an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// Liveness probe from the platform. Answered locally, never forwarded.
    Handshake,
    /// Everything else. Acknowledged and relayed downstream.
    Actionable,
}

/// A verified interaction.
///
/// Keeps the exact bytes received on the wire next to the parsed value so the
/// downstream relay sends what the platform signed, not a re-serialisation.
#[derive(Debug, Clone)]
pub struct Interaction {
    raw: Bytes,
    payload: Value,
    interaction_type: InteractionType,
}

impl Interaction {
    /// Parse a raw body. The body must be a JSON object.
    pub fn parse(raw: Bytes) -> Result<Self, CourierError> {
        let payload: Value = serde_json::from_slice(&raw)
            .map_err(|e| CourierError::malformed(format!("body is not valid JSON: {e}")))?;
        if !payload.is_object() {
            return Err(CourierError::malformed("body must be a JSON object"));
        }
        let interaction_type = InteractionType::from_payload(&payload);
        Ok(Self { raw, payload, interaction_type })
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn interaction_type(&self) -> InteractionType {
        self.interaction_type
    }

    /// Platform-assigned interaction id, when present (snowflake string).
    pub fn id(&self) -> Option<&str> {
        self.payload.get("id").and_then(Value::as_str)
    }

    /// Invoked command name for application commands.
    pub fn command_name(&self) -> Option<&str> {
        self.payload
            .get("data")
            .and_then(|d| d.get("name"))
            .and_then(Value::as_str)
    }
}

/// Interaction callback type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InteractionResponseType {
    Pong = 1,
    ChannelMessageWithSource = 4,
    DeferredChannelMessageWithSource = 5,
    DeferredUpdateMessage = 6,
    UpdateMessage = 7,
}

/// Reply body sent to the platform.
///
/// 1=PONG, 4=CHANNEL_MESSAGE_WITH_SOURCE, 5=DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE,
/// 6=DEFERRED_UPDATE_MESSAGE, 7=UPDATE_MESSAGE
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub response_type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl InteractionResponse {
    pub fn new(response_type: InteractionResponseType) -> Self {
        Self { response_type: response_type as u8, data: None }
    }

    /// `{"type":1}`
    pub fn pong() -> Self {
        Self::new(InteractionResponseType::Pong)
    }

    /// `{"type":5}`: acknowledged, the real reply follows out-of-band.
    pub fn deferred() -> Self {
        Self::new(InteractionResponseType::DeferredChannelMessageWithSource)
    }
}
