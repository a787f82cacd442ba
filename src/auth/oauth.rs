//! Google sign-in through the authorization-code flow.
//!
//! The provider is a black box to the rest of the crate: [`OAuthProvider`] builds the
//! consent URL for a given `state` and turns a callback `code` into a verified profile.
//! CSRF protection lives in the caller, which signs and checks `state` with
//! [`JwtKeys`](super::jwt::JwtKeys).

use anyhow::Context;
use async_trait::async_trait;
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;

use crate::config::GoogleConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Identity returned by the provider after a successful exchange.
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub email: String,
    pub name: String,
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn authorize_url(&self, state: &str) -> String;

    async fn exchange(&self, code: &str) -> anyhow::Result<OAuthProfile>;
}

#[derive(Debug, Deserialize)]
struct GoogleUser {
    email: String,
    name: Option<String>,
}

type GoogleClient = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

pub struct GoogleOAuth {
    client: GoogleClient,
    http: reqwest::Client,
}

impl GoogleOAuth {
    pub fn new(cfg: &GoogleConfig) -> anyhow::Result<Self> {
        let client = BasicClient::new(ClientId::new(cfg.client_id.clone()))
            .set_client_secret(ClientSecret::new(cfg.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(GOOGLE_AUTH_URL.to_string())?)
            .set_token_uri(TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?)
            .set_redirect_uri(
                RedirectUrl::new(cfg.redirect_url.clone()).context("GOOGLE_REDIRECT_URL")?,
            );

        // The token endpoint must not be allowed to bounce us elsewhere.
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build oauth http client")?;

        Ok(Self { client, http })
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuth {
    fn authorize_url(&self, state: &str) -> String {
        let state = state.to_string();
        let (url, _) = self
            .client
            .authorize_url(move || CsrfToken::new(state))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .url();
        url.to_string()
    }

    async fn exchange(&self, code: &str) -> anyhow::Result<OAuthProfile> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .context("exchange code with google")?;

        let user: GoogleUser = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .context("fetch google userinfo")?
            .error_for_status()
            .context("google userinfo status")?
            .json()
            .await
            .context("decode google userinfo")?;

        let name = user
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| user.email.clone());
        Ok(OAuthProfile {
            email: user.email,
            name,
        })
    }
}
