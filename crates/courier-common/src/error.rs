//! Centralized error types for Courier.
//!
//! Uses `thiserror` for ergonomic error definitions and provides HTTP-friendly
//! error variants that can be directly converted to responses for the platform.
//!
//! Only [`CourierError::InvalidSignature`], [`CourierError::MalformedPayload`],
//! [`CourierError::PayloadTooLarge`] and [`CourierError::Internal`] ever reach a
//! caller. Configuration and forwarding
//! errors stay inside the service and surface through logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Plain-text body the platform receives when signature verification fails.
pub const INVALID_SIGNATURE_BODY: &str = "invalid request signature";

/// Core application error type used across all Courier crates.
#[derive(Debug, thiserror::Error)]
pub enum CourierError {
    // === Authentication ===
    #[error("Invalid request signature")]
    InvalidSignature,

    // === Payload ===
    #[error("Malformed interaction payload: {message}")]
    MalformedPayload { message: String },

    #[error("Interaction payload exceeds the configured size limit")]
    PayloadTooLarge,

    // === Configuration ===
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // === Downstream ===
    #[error("Forwarding failed: {message}")]
    Forwarding { message: String },

    // === Infrastructure ===
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body sent to callers.
#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    error: String,
    message: String,
}

impl CourierError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload { message: message.into() }
    }

    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Configuration { .. } | Self::Forwarding { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Error code string for programmatic handling.
    pub fn error_code(&self) -> &str {
        match self {
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Forwarding { .. } => "FORWARDING_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for CourierError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if matches!(self, CourierError::InvalidSignature) {
            return (status, INVALID_SIGNATURE_BODY).into_response();
        }

        // Don't leak internal details to callers
        let message = match &self {
            CourierError::Configuration { message } | CourierError::Forwarding { message } => {
                tracing::error!("{}: {message}", self.error_code());
                "An internal error occurred".to_string()
            }
            CourierError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            code: status.as_u16(),
            error: self.error_code().to_string(),
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for Results using CourierError.
pub type CourierResult<T> = Result<T, CourierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(CourierError::InvalidSignature.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(CourierError::malformed("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(CourierError::PayloadTooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(CourierError::PayloadTooLarge.error_code(), "PAYLOAD_TOO_LARGE");
        assert_eq!(
            CourierError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn invalid_signature_renders_plain_401() {
        let resp = CourierError::InvalidSignature.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let ct = resp
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(ct.starts_with("text/plain"));
    }
}
