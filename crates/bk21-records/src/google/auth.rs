//! Google OAuth access tokens.
//!
//! Two credential kinds are supported:
//! - a service account key file, exchanged through a signed RS256 assertion
//! - an authorized-user `token.json` holding a refresh token; refreshed
//!   tokens are written back to the same file
//!
//! The interactive consent flow that first issues `token.json` is not part
//! of this crate.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::client::{build_http_client, read_json};
use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Lifetime requested for service account assertions.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    api::TOKEN_URI.to_string()
}

/// Service account key file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Service account email.
    pub client_email: String,

    /// PEM-encoded RSA private key.
    pub private_key: String,

    /// Token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// Authorized-user token file, as written by the Google auth libraries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    /// Last access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Long-lived refresh token.
    pub refresh_token: String,

    /// OAuth client id.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Expiry of `token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,

    /// Fields this crate does not use, preserved on rewrite.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Credential source.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Service account key.
    ServiceAccount(ServiceAccountKey),

    /// Authorized user with the file it was loaded from.
    AuthorizedUser {
        /// Parsed token file.
        user: Box<AuthorizedUser>,
        /// File to write refreshed tokens to.
        path: PathBuf,
    },

    /// Pre-issued bearer token (tests, short scripts).
    Fixed(String),
}

impl Credentials {
    /// Load a service account key file.
    pub fn service_account(path: &Path) -> ClientResult<Self> {
        let text = read_credential_file(path)?;
        Ok(Self::ServiceAccount(serde_json::from_str(&text)?))
    }

    /// Load an authorized-user token file.
    pub fn authorized_user(path: &Path) -> ClientResult<Self> {
        let text = read_credential_file(path)?;
        Ok(Self::AuthorizedUser { user: Box::new(serde_json::from_str(&text)?), path: path.into() })
    }

    /// Prefer the authorized-user token, fall back to the service account.
    pub fn discover(config: &Config) -> ClientResult<Self> {
        if config.token_path.exists() {
            tracing::debug!(path = %config.token_path.display(), "Using authorized-user token");
            return Self::authorized_user(&config.token_path);
        }
        if config.service_account_path.exists() {
            tracing::debug!(path = %config.service_account_path.display(), "Using service account");
            return Self::service_account(&config.service_account_path);
        }
        Err(ClientError::auth(format!(
            "no credentials found at {} or {}",
            config.token_path.display(),
            config.service_account_path.display()
        )))
    }
}

fn read_credential_file(path: &Path) -> ClientResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| ClientError::auth(format!("cannot read {}: {e}", path.display())))
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_none_or(|at| at - ChronoDuration::seconds(EXPIRY_MARGIN_SECS) > now)
    }
}

/// Issues and caches access tokens.
pub struct TokenProvider {
    http: ClientWithMiddleware,
    credentials: Mutex<Credentials>,
    token_url: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Create a provider for the given credentials.
    pub fn new(config: &Config, credentials: Credentials) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let cached = match &credentials {
            Credentials::Fixed(token) => Some(CachedToken { value: token.clone(), expires_at: None }),
            Credentials::AuthorizedUser { user, .. } => user
                .token
                .clone()
                .map(|value| CachedToken { value, expires_at: user.expiry }),
            Credentials::ServiceAccount(_) => None,
        };

        Ok(Self {
            http: build_http_client(config, headers)?,
            credentials: Mutex::new(credentials),
            token_url: config.token_url.clone(),
            cached: Mutex::new(cached),
        })
    }

    /// Provider for a fixed bearer token.
    pub fn fixed(config: &Config, token: impl Into<String>) -> ClientResult<Self> {
        Self::new(config, Credentials::Fixed(token.into()))
    }

    /// Current access token, refreshed when missing or about to expire.
    pub async fn access_token(&self) -> ClientResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch_token(now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn fetch_token(&self, now: DateTime<Utc>) -> ClientResult<CachedToken> {
        let mut credentials = self.credentials.lock().await;

        match &mut *credentials {
            Credentials::Fixed(token) => Ok(CachedToken { value: token.clone(), expires_at: None }),
            Credentials::ServiceAccount(key) => {
                let token_uri = self.token_url.clone().unwrap_or_else(|| key.token_uri.clone());
                let assertion = sign_assertion(key, &token_uri, now)?;
                let form = [
                    ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                    ("assertion", assertion.as_str()),
                ];
                let resp = self.exchange(&token_uri, &form).await?;
                tracing::info!(account = %key.client_email, "Service account token issued");
                Ok(to_cached(resp, now))
            }
            Credentials::AuthorizedUser { user, path } => {
                let token_uri = self.token_url.clone().unwrap_or_else(|| user.token_uri.clone());
                let form = [
                    ("grant_type", "refresh_token"),
                    ("refresh_token", user.refresh_token.as_str()),
                    ("client_id", user.client_id.as_str()),
                    ("client_secret", user.client_secret.as_str()),
                ];
                let resp = self.exchange(&token_uri, &form).await?;
                let cached = to_cached(resp, now);

                user.token = Some(cached.value.clone());
                user.expiry = cached.expires_at;
                persist_user(user, path)?;
                tracing::info!(path = %path.display(), "Refreshed user token");

                Ok(cached)
            }
        }
    }

    async fn exchange(&self, token_uri: &str, form: &[(&str, &str)]) -> ClientResult<TokenResponse> {
        let body = serde_urlencoded::to_string(form)
            .map_err(|e| ClientError::auth(format!("cannot encode token request: {e}")))?;
        let response = self.http.post(token_uri).body(body).send().await?;

        read_json(response).await.map_err(|e| match e {
            ClientError::BadRequest { message } | ClientError::Unauthorized { message, .. } => {
                ClientError::auth(format!("token endpoint rejected credentials: {message}"))
            }
            other => other,
        })
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider").field("token_url", &self.token_url).finish()
    }
}

fn to_cached(resp: TokenResponse, now: DateTime<Utc>) -> CachedToken {
    CachedToken {
        value: resp.access_token,
        expires_at: resp.expires_in.map(|secs| now + ChronoDuration::seconds(secs)),
    }
}

fn sign_assertion(key: &ServiceAccountKey, token_uri: &str, now: DateTime<Utc>) -> ClientResult<String> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: api::SCOPES.join(" "),
        aud: token_uri,
        iat: now.timestamp(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
    };

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| ClientError::auth(format!("invalid service account key: {e}")))?;

    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| ClientError::auth(format!("cannot sign assertion: {e}")))
}

fn persist_user(user: &AuthorizedUser, path: &Path) -> ClientResult<()> {
    let json = serde_json::to_string_pretty(user)?;
    std::fs::write(path, json)
        .map_err(|e| ClientError::auth(format!("cannot write {}: {e}", path.display())))
}
