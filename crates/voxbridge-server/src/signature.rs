//! Webhook authenticity check.
//!
//! Inbound deliveries carry an HMAC-SHA256 of the raw request body, hex
//! encoded, computed with a per-provider shared secret. Verification runs
//! before the payload is parsed; a failed check discards the delivery.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const BLOCK_SIZE: usize = 64;

#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into().into_bytes(),
        }
    }

    /// Hex HMAC-SHA256 of `body` under the shared secret.
    pub fn sign(&self, body: &[u8]) -> String {
        hex::encode(hmac_sha256(&self.secret, body))
    }

    /// Constant-time comparison against the header value. A `sha256=`
    /// prefix and mixed-case hex are tolerated; anything that does not
    /// decode to 32 bytes fails.
    pub fn verify(&self, body: &[u8], header_value: &str) -> bool {
        let candidate = header_value
            .strip_prefix("sha256=")
            .unwrap_or(header_value)
            .trim();
        let Ok(provided) = hex::decode(candidate.to_ascii_lowercase()) else {
            return false;
        };
        let expected = hmac_sha256(&self.secret, body);
        expected.ct_eq(provided.as_slice()).into()
    }
}

/// Standard two-pass HMAC construction over SHA-256.
fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut block_key = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        let digest = Sha256::digest(key);
        block_key[..digest.len()].copy_from_slice(&digest);
    } else {
        block_key[..key.len()].copy_from_slice(key);
    }

    let mut inner = Sha256::new();
    let ipad: Vec<u8> = block_key.iter().map(|b| b ^ 0x36).collect();
    inner.update(&ipad);
    inner.update(message);
    let inner_digest = inner.finalize();

    let mut outer = Sha256::new();
    let opad: Vec<u8> = block_key.iter().map(|b| b ^ 0x5c).collect();
    outer.update(&opad);
    outer.update(inner_digest);
    outer.finalize().into()
}
