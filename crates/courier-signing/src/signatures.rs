//! Signed-message construction and lenient decoding of signatures and keys.
//!
//! The signed content is the timestamp header's UTF-8 bytes followed by the
//! raw request body:
//!
//! ```text
//! message = timestamp.as_bytes() || body
//! ```
//!
//! Signatures normally arrive hex-encoded. Base64 (standard or URL-safe,
//! padded or not) is also accepted. Anything that does not decode to exactly
//! 64 bytes is treated as an invalid signature.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use ed25519_dalek::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH, Signature, VerifyingKey};

use crate::error::SigningError;

/// Header carrying the hex-encoded Ed25519 signature.
pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
/// Header carrying the timestamp that prefixes the signed message.
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Verify a signed callback against a hex-encoded public key.
///
/// Returns `true` iff `signature` is a valid Ed25519 signature over
/// `timestamp || body`. Malformed keys or signatures yield `false`.
pub fn verify_key(body: &[u8], signature: &str, timestamp: &str, public_key_hex: &str) -> bool {
    match decode_public_key(public_key_hex) {
        Ok(key) => verify_with(&key, body, signature, timestamp),
        Err(e) => {
            tracing::debug!("rejecting signature, public key unusable: {e}");
            false
        }
    }
}

/// Verify against an already-parsed key.
pub(crate) fn verify_with(key: &VerifyingKey, body: &[u8], signature: &str, timestamp: &str) -> bool {
    let Some(sig_bytes) = decode_signature(signature) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);
    let message = signed_message(timestamp, body);
    key.verify_strict(&message, &signature).is_ok()
}

/// Build the exact byte sequence the platform signs.
pub fn signed_message(timestamp: &str, body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);
    message
}

/// Decode a hex or base64 signature into its 64 raw bytes.
pub fn decode_signature(encoded: &str) -> Option<[u8; SIGNATURE_LENGTH]> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return None;
    }

    if let Some(bytes) = hex::decode(encoded).ok().and_then(|b| b.try_into().ok()) {
        return Some(bytes);
    }

    [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(encoded).ok())
        .and_then(|bytes| bytes.try_into().ok())
}

/// Parse a hex-encoded 32-byte Ed25519 public key.
pub fn decode_public_key(public_key_hex: &str) -> Result<VerifyingKey, SigningError> {
    let bytes = hex::decode(public_key_hex.trim())
        .map_err(|e| SigningError::NotHex(e.to_string()))?;
    let bytes: [u8; PUBLIC_KEY_LENGTH] =
        bytes.as_slice().try_into().map_err(|_| SigningError::WrongLength {
            expected: PUBLIC_KEY_LENGTH,
            actual: bytes.len(),
        })?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| SigningError::InvalidPoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::InteractionSigner;

    const TS: &str = "1700000000";
    const BODY: &[u8] = br#"{"type":1}"#;

    #[test]
    fn valid_signature_verifies() {
        let signer = InteractionSigner::generate();
        let sig = signer.sign(TS, BODY);
        assert!(verify_key(BODY, &sig, TS, &signer.public_key_hex()));
    }

    #[test]
    fn base64_signature_is_accepted() {
        let signer = InteractionSigner::generate();
        let raw = hex::decode(signer.sign(TS, BODY)).unwrap();
        for encoded in [STANDARD.encode(&raw), URL_SAFE_NO_PAD.encode(&raw)] {
            assert!(verify_key(BODY, &encoded, TS, &signer.public_key_hex()));
        }
    }

    #[test]
    fn tampered_body_or_timestamp_fails() {
        let signer = InteractionSigner::generate();
        let sig = signer.sign(TS, BODY);
        let key = signer.public_key_hex();

        let mut body = BODY.to_vec();
        body[2] ^= 0x01;
        assert!(!verify_key(&body, &sig, TS, &key));
        assert!(!verify_key(BODY, &sig, "1700000001", &key));
    }

    #[test]
    fn wrong_key_fails() {
        let signer = InteractionSigner::generate();
        let other = InteractionSigner::generate();
        let sig = signer.sign(TS, BODY);
        assert!(!verify_key(BODY, &sig, TS, &other.public_key_hex()));
    }

    #[test]
    fn garbage_inputs_are_false_not_panics() {
        let signer = InteractionSigner::generate();
        let key = signer.public_key_hex();
        assert!(!verify_key(BODY, "", TS, &key));
        assert!(!verify_key(BODY, "zz-not-hex-or-base64!!", TS, &key));
        assert!(!verify_key(BODY, "abcd", TS, &key));
        assert!(!verify_key(BODY, &"00".repeat(64), TS, &key));
        assert!(!verify_key(BODY, &signer.sign(TS, BODY), TS, "not-a-key"));
        assert!(!verify_key(BODY, &signer.sign(TS, BODY), TS, &"ab".repeat(16)));
    }

    #[test]
    fn public_key_errors_are_specific() {
        assert!(matches!(decode_public_key("xyz"), Err(SigningError::NotHex(_))));
        assert!(matches!(
            decode_public_key("abcd"),
            Err(SigningError::WrongLength { expected: 32, actual: 2 })
        ));
    }

    #[test]
    fn signed_message_is_timestamp_then_body() {
        assert_eq!(signed_message("123", b"{}"), b"123{}".to_vec());
    }
}
