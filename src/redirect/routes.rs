use axum::{http::StatusCode, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::service::UrlService;

use super::handlers::{health_check, redirect_url, RedirectState};

pub fn create_redirect_router(service: UrlService, status: StatusCode) -> Router {
    let state = Arc::new(RedirectState { service, status });

    Router::new()
        .route("/", get(health_check))
        .route("/{code}", get(redirect_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
