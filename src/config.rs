//! Client configuration.

use std::env;
use std::fmt;
use std::time::Duration;

/// Default base URL of the data API.
pub const DEFAULT_API_URL: &str = "https://api.emploi-store.fr/partenaire";

/// Default OAuth2 token endpoint.
pub const DEFAULT_AUTH_URL: &str =
    "https://entreprise.pole-emploi.fr/connexion/oauth2/access_token";

/// Realm the authorization server expects alongside the scope.
pub const DEFAULT_REALM: &str = "/partenaire";

/// Environment variable holding the client ID.
pub const CLIENT_ID_ENV: &str = "EMPLOI_STORE_CLIENT_ID";

/// Environment variable holding the client secret.
pub const CLIENT_SECRET_ENV: &str = "EMPLOI_STORE_CLIENT_SECRET";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "EMPLOI_STORE_API_URL";

/// Environment variable overriding the token endpoint.
pub const AUTH_URL_ENV: &str = "EMPLOI_STORE_AUTH_URL";

/// Settings for an [`EmploiStoreClient`](crate::EmploiStoreClient).
///
/// Credentials are optional here: a client can be built without them and
/// only fails once it needs a token.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use emploi_store::ClientConfig;
///
/// let config = ClientConfig::new("my-id", "my-secret")
///     .with_api_url("http://localhost:8080")
///     .with_timeout(Duration::from_secs(30));
/// assert_eq!(config.api_url, "http://localhost:8080");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_url: String,
    pub auth_url: String,
    pub realm: String,
    /// How long a cached token must stay valid to be reused for a call.
    pub token_min_validity: Duration,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            realm: DEFAULT_REALM.to_string(),
            token_min_validity: Duration::from_secs(5),
            timeout: Duration::from_secs(300),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("api_url", &self.api_url)
            .field("auth_url", &self.auth_url)
            .field("realm", &self.realm)
            .field("token_min_validity", &self.token_min_validity)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Configuration with explicit credentials and default endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            ..Self::default()
        }
    }

    /// Read configuration from environment variables.
    ///
    /// Uses `EMPLOI_STORE_CLIENT_ID` and `EMPLOI_STORE_CLIENT_SECRET` for the
    /// credentials, and optionally `EMPLOI_STORE_API_URL` and
    /// `EMPLOI_STORE_AUTH_URL` to point at other endpoints. Unset or empty
    /// credentials are left as `None`.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.is_empty());

        let mut config = Self {
            client_id: non_empty(CLIENT_ID_ENV),
            client_secret: non_empty(CLIENT_SECRET_ENV),
            ..Self::default()
        };
        if let Some(url) = non_empty(API_URL_ENV) {
            config.api_url = url;
        }
        if let Some(url) = non_empty(AUTH_URL_ENV) {
            config.auth_url = url;
        }
        config
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    pub fn with_token_min_validity(mut self, validity: Duration) -> Self {
        self.token_min_validity = validity;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
