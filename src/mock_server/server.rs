//! Mock Emploi Store API server.
//!
//! Provides an axum-based HTTP server that simulates the authorization
//! server and the partner API.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::MockState;
use crate::ClientConfig;

/// Client ID accepted by the default server.
pub const MOCK_CLIENT_ID: &str = "test-client";

/// Client secret accepted by the default server.
pub const MOCK_CLIENT_SECRET: &str = "test-secret";

/// A mock Emploi Store server for testing.
///
/// The server runs in the background and serves both the token endpoint
/// and the API, so a client can be pointed at it with
/// [`client_config`](Self::client_config).
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with default fixtures.
    ///
    /// The server listens on a random available port and only accepts
    /// [`MOCK_CLIENT_ID`] / [`MOCK_CLIENT_SECRET`].
    pub async fn start() -> Self {
        Self::with_state(Self::default_state()).await
    }

    /// Start a mock server with empty state.
    ///
    /// Any credentials are accepted.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Base URL of the partner API.
    pub fn api_url(&self) -> String {
        format!("{}/partenaire", self.url)
    }

    /// URL of the token endpoint.
    pub fn auth_url(&self) -> String {
        format!("{}/connexion/oauth2/access_token", self.url)
    }

    /// Client configuration pointing at this server with the default
    /// credentials.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(MOCK_CLIENT_ID, MOCK_CLIENT_SECRET)
            .with_api_url(self.api_url())
            .with_auth_url(self.auth_url())
    }

    /// Get access to the server's shared state.
    ///
    /// This allows modifying the mock data during a test.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Shutdown the server.
    ///
    /// This aborts the server task. It's safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// Create the default state with common test fixtures.
    fn default_state() -> MockState {
        MockState::from_scenario(Fixtures::default_scenario())
            .with_credentials(MOCK_CLIENT_ID, MOCK_CLIENT_SECRET)
    }

    /// Create the axum router with all routes.
    pub(crate) fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        Router::new()
            // Authorization server
            .route(
                "/connexion/oauth2/access_token",
                post(handlers::issue_token),
            )
            // Datastore actions
            .route(
                "/partenaire/infotravail/v1/organization_show",
                get(handlers::organization_show),
            )
            .route(
                "/partenaire/infotravail/v1/package_show",
                get(handlers::package_show),
            )
            .route(
                "/partenaire/infotravail/v1/resource_show",
                get(handlers::resource_show),
            )
            .route(
                "/partenaire/infotravail/v1/datastore_search",
                get(handlers::datastore_search),
            )
            // Company search
            .route(
                "/partenaire/labonneboite/v1/company/",
                get(handlers::search_companies),
            )
            // Health check
            .route("/health", get(health_check))
            .with_state(state)
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_server::fixtures::BMO_2015_RECORDS;
    use crate::{
        list_packages, EmploiStoreClient, EmploiStoreError, Get, Package, PackageSelector,
        RecordQuery, ResourceSelector,
    };
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use futures_util::TryStreamExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_server_starts_and_responds() {
        let server = MockServer::start().await;

        // Server should be accessible
        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/health", server.url()))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        assert_eq!(response.text().await.unwrap(), "ok");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_router_rejects_missing_token() {
        let app = MockServer::create_router(MockServer::default_state().shared());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/partenaire/infotravail/v1/package_show?id=pkg-bmo")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_get_package_with_client() {
        let server = MockServer::start().await;
        let client = EmploiStoreClient::with_config(server.client_config()).unwrap();

        let package = Package::get(&client, PackageSelector::name("bmo"))
            .await
            .expect("Failed to get package");

        assert_eq!(package.id, "pkg-bmo");
        assert_eq!(package.resources.len(), 3);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_stream_records_with_client() {
        let server = MockServer::start().await;
        let client = EmploiStoreClient::with_config(server.client_config()).unwrap();

        let package = Package::get(&client, PackageSelector::name("bmo"))
            .await
            .unwrap();
        let resource = package
            .get_resource(&client, &ResourceSelector::by_pattern("2015").unwrap())
            .await
            .unwrap();

        let records: Vec<_> = resource
            .records(&client, RecordQuery::default())
            .try_collect()
            .await
            .unwrap();

        assert_eq!(records.len(), BMO_2015_RECORDS);
        assert_eq!(server.state().read().await.search_requests, 3);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_wrong_credentials() {
        let server = MockServer::start().await;
        let config = ClientConfig::new("intruder", "nope")
            .with_api_url(server.api_url())
            .with_auth_url(server.auth_url());
        let client = EmploiStoreClient::with_config(config).unwrap();

        let err = list_packages(&client).await.unwrap_err();
        assert!(matches!(
            err,
            EmploiStoreError::Authentication {
                status_code: Some(401),
                ..
            }
        ));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_server() {
        let server = MockServer::start_empty().await;
        let config = server.client_config();
        let client = EmploiStoreClient::with_config(config).unwrap();

        let packages = list_packages(&client).await.unwrap();
        assert!(packages.is_empty());

        let err = Package::get(&client, PackageSelector::id("nope"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_custom_state() {
        let state = MockState::new()
            .with_package(Fixtures::package(
                "pkg-custom",
                "custom",
                vec![Fixtures::resource("r-1", "Only resource", None)],
            ))
            .with_records("r-1", Fixtures::numbered_records(3));

        let server = MockServer::with_state(state).await;
        let client = EmploiStoreClient::with_config(server.client_config()).unwrap();

        let package = Package::get(&client, PackageSelector::name("custom"))
            .await
            .expect("Failed to get package");
        assert_eq!(package.list_resources(), vec!["Only resource"]);

        server.shutdown().await;
    }
}
