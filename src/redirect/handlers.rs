use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::ApiError;
use crate::service::UrlService;

pub struct RedirectState {
    pub service: UrlService,
    pub status: StatusCode,
}

/// Redirect to the original URL, recording the click
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    let Some(mapping) = state.service.resolve(&code).await? else {
        return Err(ApiError::NotFound("URL not found".to_string()));
    };

    let location = HeaderValue::from_str(&mapping.original_url).map_err(|e| {
        ApiError::Internal(anyhow::anyhow!(
            "stored URL for '{code}' is not a valid Location header: {e}"
        ))
    })?;

    Ok((state.status, [(header::LOCATION, location)]).into_response())
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
