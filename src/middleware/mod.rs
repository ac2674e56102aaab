mod user_auth;

pub use user_auth::*;

/// Tracks how a request was authenticated.
/// Used for audit logging.
#[derive(Debug, Clone)]
pub struct AuthMethod {
    /// The visible key prefix (e.g., "rg_a1b2c3d4")
    pub key_prefix: String,
}
