use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthService};
use crate::config::CorsConfig;
use crate::service::UrlService;

use super::handlers::{health_check, my_urls, shorten_url, total_clicks, url_analytics, AppState};

pub fn create_api_router(
    service: UrlService,
    auth_service: Arc<AuthService>,
    cors: &CorsConfig,
) -> Router {
    let state = Arc::new(AppState { service });

    let protected_routes = Router::new()
        .route("/urls/shorten", post(shorten_url))
        .route("/urls/myurls", get(my_urls))
        .route("/urls/analytics/{short_url}", get(url_analytics))
        .route("/urls/totalclicks", get(total_clicks))
        .route_layer(middleware::from_fn(move |headers, req, next| {
            let auth = Arc::clone(&auth_service);
            auth_middleware(auth, headers, req, next)
        }))
        .with_state(state);

    let api = Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
