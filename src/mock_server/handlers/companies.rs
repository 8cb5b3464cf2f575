//! Company search handler.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use super::authorize;
use crate::mock_server::state::MockState;

/// Query parameters of the company search.
#[derive(Debug, Deserialize)]
pub struct CompaniesQuery {
    pub commune_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance: Option<f64>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// GET /partenaire/labonneboite/v1/company/
pub async fn search_companies(
    State(state): State<Arc<RwLock<MockState>>>,
    headers: HeaderMap,
    Query(query): Query<CompaniesQuery>,
) -> Response {
    let state = state.read().await;
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let located =
        query.commune_id.is_some() || (query.latitude.is_some() && query.longitude.is_some());
    if !located {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid request: missing arguments: commune_id"})),
        )
            .into_response();
    }

    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(100);
    let distance = query.distance.unwrap_or(10.0);

    let companies: Vec<_> = state
        .companies
        .iter()
        .filter(|c| c.distance.map(|d| d <= distance).unwrap_or(true))
        .collect();
    let count = companies.len();
    let page_items: Vec<_> = companies
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "companies": page_items,
            "companies_count": count,
        })),
    )
        .into_response()
}
