use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::error::ApiError;
use crate::analytics::{parse_date, parse_date_time, ClickCount};
use crate::auth::AuthClaims;
use crate::models::{ShortenRequest, UrlMappingDto};
use crate::service::UrlService;

pub struct AppState {
    pub service: UrlService,
}

#[derive(Serialize, Deserialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// `startDate` / `endDate` query parameters, parsed per endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: String,
    pub end_date: String,
}

/// Create a new short URL owned by the caller
pub async fn shorten_url(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthClaims>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<UrlMappingDto>, ApiError> {
    let mapping = state
        .service
        .create_short_url(&payload.original_url, &claims.username)
        .await?;

    Ok(Json(mapping.into()))
}

/// List the caller's short URLs
pub async fn my_urls(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<Vec<UrlMappingDto>>, ApiError> {
    let urls = state.service.urls_for_owner(&claims.username).await?;
    Ok(Json(urls.into_iter().map(UrlMappingDto::from).collect()))
}

/// Per-date clicks on one short URL; dates are ISO local date-times
pub async fn url_analytics(
    State(state): State<Arc<AppState>>,
    Path(short_url): Path<String>,
    Query(params): Query<DateRangeQuery>,
) -> Result<Json<Vec<ClickCount>>, ApiError> {
    let start = parse_date_time("startDate", &params.start_date)?;
    let end = parse_date_time("endDate", &params.end_date)?;

    state
        .service
        .click_counts_by_date(&short_url, start, end)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("short url '{short_url}' not found")))
}

/// Per-date clicks across all of the caller's short URLs; dates are ISO dates
pub async fn total_clicks(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<AuthClaims>,
    Query(params): Query<DateRangeQuery>,
) -> Result<Json<BTreeMap<NaiveDate, i64>>, ApiError> {
    let start = parse_date("startDate", &params.start_date)?;
    let end = parse_date("endDate", &params.end_date)?;

    let totals = state
        .service
        .total_clicks(&claims.username, start, end)
        .await?;

    Ok(Json(totals))
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
