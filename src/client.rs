//! Emploi Store API client.
//!
//! Low-level HTTP client that handles authentication and raw requests.
//! Higher-level operations live on the model types and endpoint functions.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use crate::auth::TokenCache;
use crate::config::ClientConfig;
use crate::error::{EmploiStoreError, Result};
use crate::models::PackageSummary;

const USER_AGENT: &str = concat!("emploi-store/", env!("CARGO_PKG_VERSION"));

/// Path prefix of the datastore (open data) API.
const DATASTORE_PATH: &str = "infotravail/v1/";

/// Scope granting access to the datastore API.
pub const DATASTORE_SCOPE: &str = "api_infotravailv1";

/// Query for endpoints that take no parameters.
pub(crate) const NO_QUERY: &[(&str, &str)] = &[];

/// Datastore responses wrap their payload in `{success, result}`.
#[derive(Debug, Deserialize)]
struct DatastoreEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Option<Value>,
}

/// Low-level Emploi Store API client.
///
/// Handles authentication and HTTP requests. Package, resource and endpoint
/// operations take a `&EmploiStoreClient` and never own it.
///
/// This struct is cheaply cloneable; clones share the connection pool, the
/// token cache and the package listing cache.
///
/// # Example
///
/// ```no_run
/// use emploi_store::EmploiStoreClient;
///
/// # fn example() -> emploi_store::Result<()> {
/// // Credentials from EMPLOI_STORE_CLIENT_ID / EMPLOI_STORE_CLIENT_SECRET
/// let client = EmploiStoreClient::from_env()?;
///
/// // Or explicit credentials
/// let client = EmploiStoreClient::new("my-id", "my-secret")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EmploiStoreClient {
    http: Client,
    api_url: Arc<Url>,
    tokens: Arc<TokenCache>,
    token_min_validity: Duration,
    packages: Arc<RwLock<Option<Arc<BTreeMap<String, PackageSummary>>>>>,
}

impl std::fmt::Debug for EmploiStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmploiStoreClient")
            .field("api_url", &self.api_url.as_str())
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl EmploiStoreClient {
    /// Create a client from environment variables.
    ///
    /// Missing credentials are not an error here; the first call that needs
    /// a token fails with [`EmploiStoreError::ConfigMissing`].
    ///
    /// # Errors
    ///
    /// Returns an error if a URL override is invalid.
    pub fn from_env() -> Result<Self> {
        Self::with_config(ClientConfig::from_env())
    }

    /// Create a client with explicit credentials and default endpoints.
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self> {
        Self::with_config(ClientConfig::new(client_id, client_secret))
    }

    /// Create a client from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API or token URL is invalid.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        // Ensure base URL ends with /
        let api_url_str = if config.api_url.ends_with('/') {
            config.api_url.clone()
        } else {
            format!("{}/", config.api_url)
        };
        let api_url = Url::parse(&api_url_str)?;
        let auth_url = Url::parse(&config.auth_url)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(config.timeout)
            .build()
            .map_err(EmploiStoreError::HttpError)?;

        let tokens = TokenCache::new(
            http.clone(),
            auth_url,
            config.realm,
            config.client_id,
            config.client_secret,
        );

        Ok(Self {
            http,
            api_url: Arc::new(api_url),
            tokens: Arc::new(tokens),
            token_min_validity: config.token_min_validity,
            packages: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the API base URL.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Token cache shared by this client and its clones.
    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    /// Return an access token for `scope` valid for at least `valid_for`.
    pub async fn access_token(&self, scope: &str, valid_for: Duration) -> Result<String> {
        self.tokens.get_token(scope, valid_for).await
    }

    /// Make an authenticated GET request and decode the JSON body.
    ///
    /// Returns `Ok(None)` when the API signals "no data": an empty body,
    /// HTTP 204 or HTTP 404.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json<Q: Serialize + ?Sized>(
        &self,
        scope: &str,
        path: &str,
        query: &Q,
    ) -> Result<Option<Value>> {
        self.send_json(Method::GET, scope, path, query).await
    }

    /// Make an authenticated POST request with query parameters and decode
    /// the JSON body. Same contract as [`get_json`](Self::get_json).
    #[tracing::instrument(skip(self, query))]
    pub async fn post_json<Q: Serialize + ?Sized>(
        &self,
        scope: &str,
        path: &str,
        query: &Q,
    ) -> Result<Option<Value>> {
        self.send_json(Method::POST, scope, path, query).await
    }

    /// Call a datastore action (e.g. `package_show`) and unwrap its
    /// `{success, result}` envelope.
    ///
    /// An envelope with `success: false` is treated as "no data".
    #[tracing::instrument(skip(self, query))]
    pub async fn datastore_get<Q: Serialize + ?Sized>(
        &self,
        action: &str,
        query: &Q,
    ) -> Result<Option<Value>> {
        let path = format!("{DATASTORE_PATH}{}", action.trim_start_matches('/'));
        let Some(value) = self.get_json(DATASTORE_SCOPE, &path, query).await? else {
            return Ok(None);
        };

        let envelope: DatastoreEnvelope = serde_json::from_value(value)?;
        if !envelope.success {
            tracing::warn!(action, "datastore call reported no success");
            return Ok(None);
        }
        Ok(envelope.result.filter(|r| !r.is_null()))
    }

    /// Cached package listing, if it was already fetched.
    pub(crate) async fn cached_packages(&self) -> Option<Arc<BTreeMap<String, PackageSummary>>> {
        self.packages.read().await.clone()
    }

    pub(crate) async fn cache_packages(
        &self,
        packages: BTreeMap<String, PackageSummary>,
    ) -> Arc<BTreeMap<String, PackageSummary>> {
        let packages = Arc::new(packages);
        *self.packages.write().await = Some(packages.clone());
        packages
    }

    async fn send_json<Q: Serialize + ?Sized>(
        &self,
        method: Method,
        scope: &str,
        path: &str,
        query: &Q,
    ) -> Result<Option<Value>> {
        let url = self.api_url.join(path.trim_start_matches('/'))?;
        let token = self.tokens.get_token(scope, self.token_min_validity).await?;

        let response = self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(EmploiStoreError::HttpError)?;

        let status = response.status();
        let body = response.text().await.map_err(EmploiStoreError::HttpError)?;
        Self::decode_body(status, body)
    }

    /// Map a status and raw body to the gateway contract.
    fn decode_body(status: StatusCode, body: String) -> Result<Option<Value>> {
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            tracing::debug!(%status, "no data");
            return Ok(None);
        }

        if !status.is_success() {
            return Err(EmploiStoreError::ApiRequest {
                status_code: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(%status, error = %e, "response body is not JSON");
                Err(EmploiStoreError::ApiRequest {
                    status_code: status.as_u16(),
                    body,
                })
            }
        }
    }
}
