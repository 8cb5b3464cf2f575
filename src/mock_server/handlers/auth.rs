//! OAuth2 token endpoint handler.

use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;
use crate::DEFAULT_REALM;

/// Query parameters of the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub realm: Option<String>,
}

/// Form fields of a client credentials grant.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub grant_type: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scope: String,
}

/// POST /connexion/oauth2/access_token
pub async fn issue_token(
    State(state): State<Arc<RwLock<MockState>>>,
    Query(query): Query<TokenQuery>,
    Form(form): Form<TokenForm>,
) -> impl IntoResponse {
    if query.realm.as_deref() != Some(DEFAULT_REALM) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_request",
                "error_description": "Unknown realm"
            })),
        )
            .into_response();
    }

    if form.grant_type != "client_credentials" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unsupported_grant_type"})),
        )
            .into_response();
    }

    let application = format!("application_{}", form.client_id);
    if !form.scope.split(' ').any(|s| s == application) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_scope",
                "error_description": format!("Scope must include {}", application)
            })),
        )
            .into_response();
    }

    let mut state = state.write().await;
    let lifetime = state.token_lifetime_secs;

    match state.issue_token(&form.client_id, &form.client_secret, &form.scope) {
        Some(token) => (
            StatusCode::OK,
            Json(json!({
                "access_token": token,
                "token_type": "Bearer",
                "expires_in": lifetime,
                "scope": form.scope,
            })),
        )
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "invalid_client",
                "error_description": "Client authentication failed"
            })),
        )
            .into_response(),
    }
}
