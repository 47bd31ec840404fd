use std::fs;

use chrono::{DateTime, Duration, Utc};
use oauth2::basic::BasicClient;
use oauth2::reqwest::http_client;
use oauth2::{AuthUrl, ClientId, ClientSecret, RefreshToken, TokenResponse, TokenUrl};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("could not read token cache {path}: {source} (run the `gauth` binary once to authorize)")]
    Cache {
        path: String,
        source: std::io::Error,
    },
    #[error("could not read client secret {path}: {source}")]
    Secret {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("token cache has no refresh token; run the `gauth` binary again")]
    NoRefreshToken,
    #[error("refresh token exchange failed: {0}")]
    Refresh(String),
    #[error("invalid endpoint URL in client secret: {0}")]
    BadEndpoint(#[from] oauth2::url::ParseError),
}

/// Google installed-app client secret, the `credentials.json` shape.
#[derive(Deserialize)]
struct SecretFile {
    installed: InstalledSecret,
}

#[derive(Deserialize)]
pub struct InstalledSecret {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

/// Tokens persisted to disk between runs.
#[derive(Serialize, Deserialize, Debug)]
pub struct TokenCache {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl TokenCache {
    /// Fresh means at least a minute of validity left; an unknown expiry
    /// counts as stale so we refresh rather than send a dead token.
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(60) > now,
            None => false,
        }
    }
}

pub fn read_client_secret(path: &str) -> Result<InstalledSecret, AuthError> {
    let raw = fs::read_to_string(path).map_err(|source| AuthError::Secret {
        path: path.to_string(),
        source,
    })?;
    let file: SecretFile = serde_json::from_str(&raw).map_err(|source| AuthError::Json {
        path: path.to_string(),
        source,
    })?;
    Ok(file.installed)
}

pub fn oauth_client(secret: &InstalledSecret) -> Result<BasicClient, AuthError> {
    Ok(BasicClient::new(
        ClientId::new(secret.client_id.clone()),
        Some(ClientSecret::new(secret.client_secret.clone())),
        AuthUrl::new(secret.auth_uri.clone())?,
        Some(TokenUrl::new(secret.token_uri.clone())?),
    ))
}

pub fn store_token(path: &str, cache: &TokenCache) -> Result<(), AuthError> {
    let raw = serde_json::to_string_pretty(cache).map_err(|source| AuthError::Json {
        path: path.to_string(),
        source,
    })?;
    fs::write(path, raw).map_err(|source| AuthError::Cache {
        path: path.to_string(),
        source,
    })
}

/// Returns a usable access token, refreshing and re-persisting the cache
/// when the stored token is stale.
pub fn access_token(cache_path: &str, credentials_path: &str) -> Result<String, AuthError> {
    let raw = fs::read_to_string(cache_path).map_err(|source| AuthError::Cache {
        path: cache_path.to_string(),
        source,
    })?;
    let cache: TokenCache = serde_json::from_str(&raw).map_err(|source| AuthError::Json {
        path: cache_path.to_string(),
        source,
    })?;

    if cache.is_fresh(Utc::now()) {
        return Ok(cache.access_token);
    }

    let refresh = cache.refresh_token.ok_or(AuthError::NoRefreshToken)?;
    let secret = read_client_secret(credentials_path)?;
    let client = oauth_client(&secret)?;
    let token = client
        .exchange_refresh_token(&RefreshToken::new(refresh.clone()))
        .request(http_client)
        .map_err(|e| AuthError::Refresh(e.to_string()))?;

    let expiry = token
        .expires_in()
        .and_then(|d| Duration::from_std(d).ok())
        .map(|d| Utc::now() + d);
    let updated = TokenCache {
        access_token: token.access_token().secret().clone(),
        // Google omits the refresh token on renewal; keep the one we have.
        refresh_token: token
            .refresh_token()
            .map(|t| t.secret().clone())
            .or(Some(refresh)),
        expiry,
    };
    store_token(cache_path, &updated)?;

    Ok(updated.access_token)
}
