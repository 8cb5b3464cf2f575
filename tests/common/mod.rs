//! Shared wiremock setup for integration tests.

#![allow(dead_code)]

use emploi_store::{ClientConfig, EmploiStoreClient};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/connexion/oauth2/access_token";
pub const DATASTORE_PATH: &str = "/partenaire/infotravail/v1";

/// Client configuration pointing at a wiremock server.
pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new("test-id", "test-secret")
        .with_api_url(format!("{}/partenaire", server.uri()))
        .with_auth_url(format!("{}{}", server.uri(), TOKEN_PATH))
}

pub fn client_for(server: &MockServer) -> EmploiStoreClient {
    EmploiStoreClient::with_config(config_for(server)).unwrap()
}

/// Answer every token request with `test-token`, valid for ten minutes.
pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(query_param("realm", "/partenaire"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "token_type": "Bearer",
            "expires_in": 600
        })))
        .mount(server)
        .await;
}

/// Wrap a datastore result in its `{success, result}` envelope.
pub fn envelope(result: Value) -> Value {
    json!({"success": true, "result": result})
}

/// Create `count` records numbered from `start`.
pub fn records(start: usize, count: usize) -> Vec<Value> {
    (start..start + count)
        .map(|i| json!({"_id": i + 1, "ROW": i}))
        .collect()
}
