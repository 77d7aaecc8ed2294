//! API key authentication and credential handling.
//!
//! Access to the authenticated surface requires an `X-API-Key` header
//! resolving to an active, unexpired key (see [`middleware`]). Key material
//! is 256 bits of randomness, base64url encoded without padding. Passwords
//! are stored as salted SHA-256 digests and verified on login.

pub mod middleware;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Request header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Generate fresh API key material.
///
/// Returns a 256-bit random token encoded as base64url (43 characters).
#[must_use]
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a password with a fresh random salt.
///
/// Format: `<salt-b64>$<digest-b64>` where digest = SHA-256(salt ‖ password).
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = salted_digest(&salt, password);
    format!("{}${}", URL_SAFE_NO_PAD.encode(salt), URL_SAFE_NO_PAD.encode(digest))
}

/// Verify a password against a stored `salt$digest` hash.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_b64, digest_b64)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (
        URL_SAFE_NO_PAD.decode(salt_b64),
        URL_SAFE_NO_PAD.decode(digest_b64),
    ) else {
        return false;
    };
    let actual = salted_digest(&salt, password);
    // Length check first, then a full pass over every byte.
    if actual.len() != expected.len() {
        return false;
    }
    actual
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn salted_digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}
