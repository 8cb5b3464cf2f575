//! Datastore (CKAN-style) action handlers.
//!
//! Every response is wrapped in a `{success, result}` envelope.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::authorize;
use crate::mock_server::state::MockState;
use crate::{Record, DATA_ORGANIZATION};

/// Query parameters of actions taking a single ID.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: String,
}

/// Query parameters of `datastore_search`.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub id: String,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    /// JSON object of field values records must equal.
    pub filters: Option<String>,
    /// Comma separated field names to keep.
    pub fields: Option<String>,
}

fn success(result: Value) -> Response {
    (StatusCode::OK, Json(json!({"success": true, "result": result}))).into_response()
}

fn not_found(kind: &str, id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": {
                "__type": "Not Found Error",
                "message": format!("{} not found: {}", kind, id)
            }
        })),
    )
        .into_response()
}

/// GET /partenaire/infotravail/v1/organization_show
pub async fn organization_show(
    State(state): State<Arc<RwLock<MockState>>>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
) -> Response {
    let state = state.read().await;
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    if query.id != DATA_ORGANIZATION {
        return not_found("Organization", &query.id);
    }

    success(json!({
        "name": DATA_ORGANIZATION,
        "packages": state.package_summaries(),
    }))
}

/// GET /partenaire/infotravail/v1/package_show
pub async fn package_show(
    State(state): State<Arc<RwLock<MockState>>>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
) -> Response {
    let state = state.read().await;
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    match state.get_package(&query.id) {
        Some(package) => success(json!(package)),
        None => not_found("Package", &query.id),
    }
}

/// GET /partenaire/infotravail/v1/resource_show
pub async fn resource_show(
    State(state): State<Arc<RwLock<MockState>>>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
) -> Response {
    let state = state.read().await;
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    match state.get_resource(&query.id) {
        Some(resource) => success(Value::Object(resource)),
        None => not_found("Resource", &query.id),
    }
}

/// GET /partenaire/infotravail/v1/datastore_search
pub async fn datastore_search(
    State(state): State<Arc<RwLock<MockState>>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Response {
    let mut state = state.write().await;
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    state.search_requests += 1;

    let filters = match query
        .filters
        .as_deref()
        .map(serde_json::from_str::<Record>)
        .transpose()
    {
        Ok(filters) => filters.unwrap_or_default(),
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": {"__type": "Validation Error", "filters": e.to_string()}
                })),
            )
                .into_response()
        }
    };
    let fields: Option<Vec<String>> = query
        .fields
        .as_deref()
        .map(|f| f.split(',').map(str::to_string).collect());

    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(100);

    match state.search_records(&query.id, &filters, fields.as_deref(), offset, limit) {
        Some((records, total)) => success(json!({
            "resource_id": query.id,
            "offset": offset,
            "limit": limit,
            "total": total,
            "records": records,
        })),
        None => not_found("Resource", &query.id),
    }
}
