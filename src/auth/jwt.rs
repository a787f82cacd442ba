use axum::extract::FromRef;
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use serde::de::DeserializeOwned;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, StateClaims};
use crate::{config::JwtConfig, state::AppState};

const OAUTH_STATE_TTL_MINUTES: i64 = 10;

/// Why a token was rejected. The gate maps all of them to 401; the variants only
/// matter for the message and for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid token claims")]
    InvalidClaims,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat => TokenError::InvalidSignature,
            ErrorKind::Json(_)
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => TokenError::InvalidClaims,
            _ => TokenError::Malformed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Signing material built once from config at boot and shared read-only afterwards.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<IssuedToken> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> anyhow::Result<IssuedToken> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            user_id,
            iat: now.unix_timestamp() as usize,
            exp: expires_at.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies signature (HS256 only), expiry, issuer and audience, and returns the
    /// user id carried by the token.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let claims: Claims = self.decode_for(token, &self.audience)?;
        debug!(user_id = %claims.user_id, "jwt verified");
        Ok(claims.user_id)
    }

    pub fn sign_oauth_state(&self) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = StateClaims {
            nonce: Uuid::new_v4(),
            iat: now.unix_timestamp() as usize,
            exp: (now + Duration::minutes(OAUTH_STATE_TTL_MINUTES)).unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.state_audience(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify_oauth_state(&self, state: &str) -> Result<(), TokenError> {
        let _: StateClaims = self.decode_for(state, &self.state_audience())?;
        Ok(())
    }

    fn state_audience(&self) -> String {
        format!("{}:oauth-state", self.audience)
    }

    fn decode_for<T: DeserializeOwned>(&self, token: &str, audience: &str) -> Result<T, TokenError> {
        // Reject anything that is not even a JWT before the claims get a say.
        decode_header(token).map_err(|_| TokenError::Malformed)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let data = decode::<T>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 60 * 24,
        })
    }

    #[test]
    fn issued_token_verifies_to_user() {
        let keys = make_keys("dev-secret");
        let user_id = Uuid::new_v4();
        let issued = keys.issue(user_id).expect("sign");
        assert_eq!(keys.verify(&issued.token), Ok(user_id));
    }

    #[test]
    fn lifetime_is_twenty_four_hours() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc();
        let issued = keys.issue_at(Uuid::new_v4(), now).unwrap();
        assert_eq!(issued.expires_at - now, Duration::hours(24));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = make_keys("dev-secret");
        let past = OffsetDateTime::now_utc() - Duration::hours(25);
        let issued = keys.issue_at(Uuid::new_v4(), past).unwrap();
        assert_eq!(keys.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn token_still_valid_just_before_expiry() {
        let keys = make_keys("dev-secret");
        let almost = OffsetDateTime::now_utc() - Duration::hours(24) + Duration::minutes(1);
        let user_id = Uuid::new_v4();
        let issued = keys.issue_at(user_id, almost).unwrap();
        assert_eq!(keys.verify(&issued.token), Ok(user_id));
    }

    #[test]
    fn other_secret_never_verifies() {
        let issued = make_keys("secret-a").issue(Uuid::new_v4()).unwrap();
        assert_eq!(
            make_keys("secret-b").verify(&issued.token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let now = OffsetDateTime::now_utc();
        let claims = json!({
            "user_id": Uuid::new_v4(),
            "iat": now.unix_timestamp(),
            "exp": (now + Duration::hours(1)).unix_timestamp(),
            "iss": "test-issuer",
            "aud": "test-aud",
        });
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert_eq!(
            make_keys("dev-secret").verify(&token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn unsigned_token_is_malformed() {
        // {"alg":"none","typ":"JWT"}.{"user_id":"x"}.
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJ1c2VyX2lkIjoieCJ9.";
        assert_eq!(make_keys("dev-secret").verify(token), Err(TokenError::Malformed));
        assert_eq!(make_keys("dev-secret").verify("garbage"), Err(TokenError::Malformed));
    }

    #[test]
    fn wrong_claim_shape_is_invalid_claims() {
        let now = OffsetDateTime::now_utc();
        let claims = json!({
            "user_id": 42,
            "iat": now.unix_timestamp(),
            "exp": (now + Duration::hours(1)).unix_timestamp(),
            "iss": "test-issuer",
            "aud": "test-aud",
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert_eq!(
            make_keys("dev-secret").verify(&token),
            Err(TokenError::InvalidClaims)
        );
    }

    #[test]
    fn wrong_audience_is_invalid_claims() {
        let good = make_keys("same-secret");
        let bad = JwtKeys::from_config(&JwtConfig {
            secret: "same-secret".into(),
            issuer: "test-issuer".into(),
            audience: "other-aud".into(),
            ttl_minutes: 5,
        });
        let issued = good.issue(Uuid::new_v4()).unwrap();
        assert_eq!(bad.verify(&issued.token), Err(TokenError::InvalidClaims));
    }

    #[test]
    fn oauth_state_roundtrip_and_not_a_session() {
        let keys = make_keys("dev-secret");
        let state = keys.sign_oauth_state().unwrap();
        assert!(keys.verify_oauth_state(&state).is_ok());
        assert!(keys.verify(&state).is_err());

        let session = keys.issue(Uuid::new_v4()).unwrap();
        assert!(keys.verify_oauth_state(&session.token).is_err());
    }
}
