//! Mock Emploi Store server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates the
//! authorization server and the partner API. Unlike wiremock which mocks at
//! the HTTP level per-test, this server maintains state across requests:
//! tokens it issued, paginated datastore searches, request counters.
//!
//! # Example
//!
//! ```ignore
//! use emploi_store::mock_server::MockServer;
//! use emploi_store::{EmploiStoreClient, Get, Package, PackageSelector};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = EmploiStoreClient::with_config(server.client_config()).unwrap();
//!
//!     // Server comes with default fixtures
//!     let bmo = Package::get(&client, PackageSelector::name("bmo")).await.unwrap();
//!     assert_eq!(bmo.resources.len(), 3);
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{
    DefaultScenario, Fixtures, APPELLATIONS_ID, BMO_2014_ID, BMO_2015_ID, BMO_2015_RECORDS, FAP_ID,
};
pub use server::{MockServer, MOCK_CLIENT_ID, MOCK_CLIENT_SECRET};
pub use state::MockState;
