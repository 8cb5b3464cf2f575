//! OAuth2 access token cache.
//!
//! The authorization server hands out client-credentials tokens per scope.
//! [`TokenCache`] keeps the latest token of each scope and only goes back
//! to the server when the cached one would expire too soon.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use crate::error::{EmploiStoreError, Result};

/// Lifetime assumed when the server omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 600;

/// A cached access token.
#[derive(Clone)]
struct Token {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Token {
    fn is_valid_for(&self, now: DateTime<Utc>, min_valid_for: TimeDelta) -> bool {
        now + min_valid_for <= self.expires_at
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    scope: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Per-scope cache of OAuth2 access tokens.
///
/// Tokens are replaced whole under a lock, so concurrent readers never see
/// a partial value. Two callers refreshing the same scope at once may both
/// hit the authorization server; the last one to finish wins.
pub struct TokenCache {
    http: Client,
    auth_url: Url,
    realm: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    tokens: RwLock<HashMap<String, Token>>,
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("auth_url", &self.auth_url.as_str())
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl TokenCache {
    pub(crate) fn new(
        http: Client,
        auth_url: Url,
        realm: String,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Self {
        Self {
            http,
            auth_url,
            realm,
            client_id,
            client_secret,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Return a token for `scope` that stays valid for at least
    /// `min_valid_for`, requesting a new one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`EmploiStoreError::ConfigMissing`] if no credentials were
    /// configured, and [`EmploiStoreError::Authentication`] if the
    /// authorization server refuses the request or answers with something
    /// that is not a token. Nothing is cached on failure.
    pub async fn get_token(&self, scope: &str, min_valid_for: Duration) -> Result<String> {
        let min_valid_for = TimeDelta::from_std(min_valid_for).map_err(|_| {
            EmploiStoreError::InvalidArgument(format!(
                "token validity out of range: {min_valid_for:?}"
            ))
        })?;

        if let Some(token) = self.tokens.read().await.get(scope) {
            if token.is_valid_for(Utc::now(), min_valid_for) {
                return Ok(token.value.clone());
            }
        }

        let token = self.request_token(scope).await?;
        let value = token.value.clone();
        self.tokens.write().await.insert(scope.to_string(), token);
        Ok(value)
    }

    /// Drop the cached token for `scope`, if any.
    pub async fn invalidate(&self, scope: &str) {
        self.tokens.write().await.remove(scope);
    }

    /// Returns true if a token for `scope` is currently cached.
    pub async fn contains(&self, scope: &str) -> bool {
        self.tokens.read().await.contains_key(scope)
    }

    #[tracing::instrument(skip(self))]
    async fn request_token(&self, scope: &str) -> Result<Token> {
        let (client_id, client_secret) = match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => (id.as_str(), secret.as_str()),
            (None, _) => {
                return Err(EmploiStoreError::ConfigMissing(
                    "client ID not set (EMPLOI_STORE_CLIENT_ID)".to_string(),
                ))
            }
            (_, None) => {
                return Err(EmploiStoreError::ConfigMissing(
                    "client secret not set (EMPLOI_STORE_CLIENT_SECRET)".to_string(),
                ))
            }
        };

        let form = TokenRequest {
            grant_type: "client_credentials",
            client_id,
            client_secret,
            scope: format!("application_{client_id} {scope}"),
        };

        tracing::debug!(scope, "requesting access token");
        let response = self
            .http
            .post(self.auth_url.clone())
            .query(&[("realm", self.realm.as_str())])
            .form(&form)
            .send()
            .await
            .map_err(EmploiStoreError::HttpError)?;

        let status = response.status();
        let body = response.text().await.map_err(EmploiStoreError::HttpError)?;
        if !status.is_success() {
            return Err(EmploiStoreError::Authentication {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                },
                status_code: Some(status.as_u16()),
            });
        }

        let malformed = |detail: String| EmploiStoreError::Authentication {
            message: format!("malformed token response: {detail}"),
            status_code: Some(status.as_u16()),
        };
        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| malformed(e.to_string()))?;
        let value = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| malformed("missing access_token".to_string()))?;
        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at = TimeDelta::try_seconds(expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| malformed(format!("expires_in out of range: {expires_in}")))?;
        tracing::debug!(scope, %expires_at, "access token refreshed");

        Ok(Token { value, expires_at })
    }
}
