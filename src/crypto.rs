//! API key material and hashing.
//!
//! Keys are never stored in plaintext: the database holds a salted SHA-256
//! hash for lookups and a short visible prefix for audit trails.

use sha2::{Digest, Sha256};
use uuid::Uuid;

const KEY_PREFIX: &str = "rg_";
const VISIBLE_PREFIX_LEN: usize = 11;

/// Generate a new API key: `rg_` followed by 32 hex chars.
pub fn generate_api_key() -> String {
    format!("{}{}", KEY_PREFIX, Uuid::new_v4().simple())
}

/// The visible part of a key (e.g. "rg_a1b2c3d4"), safe to log and audit.
pub fn key_prefix(api_key: &str) -> String {
    api_key.chars().take(VISIBLE_PREFIX_LEN).collect()
}

/// Hash a secret for database lookups.
/// Uses SHA-256 with application salt, returns lowercase hex string.
pub fn hash_secret(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"rolegate-v1:");
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
