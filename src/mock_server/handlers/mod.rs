//! HTTP request handlers for the mock server.

pub mod auth;
pub mod companies;
pub mod datastore;

pub use auth::*;
pub use companies::*;
pub use datastore::*;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::mock_server::state::MockState;

/// Check the bearer token of a request against the issued tokens.
pub(crate) fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if state.is_issued(token) => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "invalid_token",
                "message": "Missing or unknown bearer token"
            })),
        )
            .into_response()),
    }
}
