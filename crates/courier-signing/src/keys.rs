//! Ed25519 interaction keys.
//!
//! The bridge only ever holds the application's *public* key. It is parsed once
//! at startup into an [`InteractionVerifier`] and shared read-only by every
//! request.
//!
//! [`InteractionSigner`] plays the platform's side: it owns a signing key and
//! produces `X-Signature-Ed25519` values. Tests and benchmarks use it to build
//! callbacks the verifier accepts.

use ed25519_dalek::VerifyingKey;
#[cfg(any(test, feature = "test-util"))]
use ed25519_dalek::{Signer, SigningKey};
#[cfg(any(test, feature = "test-util"))]
use rand_core::OsRng;

use crate::{
    error::SigningError,
    signatures::{decode_public_key, verify_with},
};
#[cfg(any(test, feature = "test-util"))]
use crate::signatures::signed_message;

// ─── Verifier ────────────────────────────────────────────────────────────────

/// Verifies interaction signatures against one application public key.
#[derive(Debug, Clone)]
pub struct InteractionVerifier {
    key: VerifyingKey,
}

impl InteractionVerifier {
    /// Parse a hex-encoded 32-byte public key.
    pub fn from_hex(public_key_hex: &str) -> Result<Self, SigningError> {
        Ok(Self { key: decode_public_key(public_key_hex)? })
    }

    pub fn from_key(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Public key, hex-encoded (for startup logs).
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.as_bytes())
    }

    /// Verify a callback.
    ///
    /// Missing or empty signature, timestamp or body short-circuit to `false`
    /// without touching the curve.
    pub fn verify(&self, body: Option<&[u8]>, signature: Option<&str>, timestamp: Option<&str>) -> bool {
        let (Some(body), Some(signature), Some(timestamp)) = (body, signature, timestamp) else {
            return false;
        };
        if signature.is_empty() || timestamp.is_empty() {
            return false;
        }
        verify_with(&self.key, body, signature, timestamp)
    }
}

// ─── Signer ──────────────────────────────────────────────────────────────────

/// An Ed25519 key pair that signs callbacks the way the platform does.
#[cfg(any(test, feature = "test-util"))]
pub struct InteractionSigner {
    signing_key: SigningKey,
}

#[cfg(any(test, feature = "test-util"))]
impl InteractionSigner {
    /// Generate a brand-new random key pair.
    pub fn generate() -> Self {
        Self { signing_key: SigningKey::generate(&mut OsRng) }
    }

    /// Reconstruct from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self { signing_key: SigningKey::from_bytes(seed) }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().as_bytes())
    }

    /// Sign `timestamp || body` and return the hex-encoded signature.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> String {
        let sig = self.signing_key.sign(&signed_message(timestamp, body));
        hex::encode(sig.to_bytes())
    }

    /// A verifier for this key pair's public half.
    pub fn verifier(&self) -> InteractionVerifier {
        InteractionVerifier::from_key(self.verifying_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_sign_verify() {
        let signer = InteractionSigner::generate();
        let verifier = InteractionVerifier::from_hex(&signer.public_key_hex()).unwrap();
        let sig = signer.sign("1700000000", b"{\"type\":1}");
        assert!(verifier.verify(Some(&b"{\"type\":1}"[..]), Some(sig.as_str()), Some("1700000000")));
    }

    #[test]
    fn missing_parts_are_rejected() {
        let signer = InteractionSigner::generate();
        let verifier = signer.verifier();
        let body: &[u8] = b"{}";
        let sig = signer.sign("1", body);

        assert!(!verifier.verify(None, Some(sig.as_str()), Some("1")));
        assert!(!verifier.verify(Some(body), None, Some("1")));
        assert!(!verifier.verify(Some(body), Some(sig.as_str()), None));
        assert!(!verifier.verify(Some(body), Some(""), Some("1")));
        assert!(!verifier.verify(Some(body), Some(sig.as_str()), Some("")));
    }

    #[test]
    fn from_seed_is_stable() {
        let seed = [7u8; 32];
        let a = InteractionSigner::from_seed(&seed);
        let b = InteractionSigner::from_seed(&seed);
        assert_eq!(a.public_key_hex(), b.public_key_hex());
        assert_eq!(a.sign("t", b"x"), b.sign("t", b"x"));
    }

    #[test]
    fn verifier_reports_its_key() {
        let signer = InteractionSigner::generate();
        let verifier = InteractionVerifier::from_hex(&signer.public_key_hex()).unwrap();
        assert_eq!(verifier.public_key_hex(), signer.public_key_hex());
    }
}
