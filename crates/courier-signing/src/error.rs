//! Signing-specific error types.

use thiserror::Error;

/// Errors raised while loading key material.
///
/// Verification itself never errors: a bad signature is just `false`.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Public key is not valid hex: {0}")]
    NotHex(String),

    #[error("Public key has wrong length: expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("Public key is not a valid Ed25519 point")]
    InvalidPoint,
}
