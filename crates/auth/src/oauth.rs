use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::AuthError;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// What the storefront needs from a Google account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// A federated sign-in provider using the authorization-code flow.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to in order to start sign-in.
    fn authorize_url(&self, state: &str) -> String;

    /// Trades the authorization code from the callback for a profile.
    async fn exchange(&self, code: &str) -> Result<GoogleProfile, AuthError>;
}

/// Client credentials registered with Google.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

/// Google OAuth 2.0 client.
#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    config: GoogleConfig,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthClient {
    fn authorize_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.callback_url.as_str()),
            ("response_type", "code"),
            ("scope", "openid profile email"),
            ("state", state),
        ];
        Url::parse_with_params(GOOGLE_AUTH_URL, params)
            .map_or_else(|_| GOOGLE_AUTH_URL.to_string(), String::from)
    }

    #[tracing::instrument(skip_all)]
    async fn exchange(&self, code: &str) -> Result<GoogleProfile, AuthError> {
        let token: TokenResponse = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AuthError::Provider(format!("code exchange rejected: {e}")))?
            .json()
            .await?;

        let info: UserInfo = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AuthError::Provider(format!("profile request rejected: {e}")))?
            .json()
            .await?;

        let email = info
            .email
            .ok_or_else(|| AuthError::Provider("Google account has no email".to_string()))?;
        tracing::debug!(google_id = %info.sub, "Google profile fetched");

        Ok(GoogleProfile {
            id: info.sub,
            name: info.name.unwrap_or_default(),
            email,
            avatar: info.picture,
        })
    }
}

/// Builds `{frontend}/auth/callback?...` with the given query pairs
/// percent-encoded. Returns `None` if `frontend` is not an absolute URL.
pub fn frontend_callback_url(frontend: &str, params: &[(&str, &str)]) -> Option<String> {
    let base = format!("{}/auth/callback", frontend.trim_end_matches('/'));
    Url::parse_with_params(&base, params).ok().map(String::from)
}

/// Provider that answers from a fixed code → profile table.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    profiles: HashMap<String, GoogleProfile>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, code: impl Into<String>, profile: GoogleProfile) -> Self {
        self.profiles.insert(code.into(), profile);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://accounts.example.test/authorize?state={state}")
    }

    async fn exchange(&self, code: &str) -> Result<GoogleProfile, AuthError> {
        self.profiles
            .get(code)
            .cloned()
            .ok_or_else(|| AuthError::Provider("unknown authorization code".to_string()))
    }
}
