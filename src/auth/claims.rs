use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session token payload. Decoding fails closed if any field is missing or mistyped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
    pub iss: String,    // issuer
    pub aud: String,    // audience
}

/// Payload of the OAuth `state` parameter. Carries its own audience so it can never
/// pass as a session token, and has no `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateClaims {
    pub nonce: Uuid,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}
