use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::extractors::AuthUser;
use super::jwt::{JwtKeys, TokenError};
use crate::error::AppError;

/// Gate in front of every protected route. On success the verified user id is stored in
/// the request extensions as [`AuthUser`]; handlers trust it without re-verifying.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::unauthorized("Missing Token"))?;

    let Some(token) = bearer_token(header) else {
        warn!("authorization header without bearer scheme");
        return Err(AppError::unauthorized("Invalid or Expired Token"));
    };

    let user_id = keys.verify(token).map_err(|e| {
        warn!(reason = %e, "rejected bearer token");
        match e {
            TokenError::InvalidClaims => AppError::unauthorized("Invalid Token Claims"),
            TokenError::Malformed | TokenError::InvalidSignature | TokenError::Expired => {
                AppError::unauthorized("Invalid or Expired Token")
            }
        }
    })?;

    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}

/// Token part of `Bearer <token>`; the scheme is matched case-insensitively.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
