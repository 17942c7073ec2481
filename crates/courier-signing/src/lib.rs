//! # courier-signing
//!
//! Ed25519 verification of signed interaction callbacks.
//!
//! ## Scheme
//!
//! The platform signs every callback with the application's Ed25519 key and
//! sends two headers alongside the body:
//!
//! ```text
//! X-Signature-Ed25519:   <hex signature, 64 bytes>
//! X-Signature-Timestamp: <opaque timestamp string>
//! ```
//!
//! The signed message is `timestamp || body`, where `body` is the request body
//! exactly as it arrived on the wire.
//!
//! ## Key concepts
//!
//! - **Verifier** (`keys.rs`): holds the application's public key, parsed once
//!   at startup. Verification is pure computation with a boolean outcome.
//! - **Message encoding** (`signatures.rs`): header names, signed-message
//!   construction, and lenient signature decoding (hex or base64).
//! - **Signer** (`keys.rs`, `test-util` feature): key pair used by tests and
//!   benchmarks to produce callbacks the verifier accepts.

pub mod error;
pub mod keys;
pub mod signatures;

pub use error::SigningError;
pub use keys::InteractionVerifier;
#[cfg(any(test, feature = "test-util"))]
pub use keys::InteractionSigner;
pub use signatures::{verify_key, SIGNATURE_HEADER, TIMESTAMP_HEADER};
