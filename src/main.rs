use anyhow::{Context, Result};
use std::future::IntoFuture;
use std::sync::Arc;
use tracing::info;

use tinytrail::auth::AuthService;
use tinytrail::config::{AuthMode, Config};
use tinytrail::service::UrlService;
use tinytrail::{api, redirect, storage, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing("info,tower_http=info,sqlx=warn");

    let config = Config::from_env().context("failed to load configuration")?;
    info!("Loaded configuration");

    info!("Initializing database...");
    let storage = storage::connect(&config.database).await?;
    info!("Database initialized successfully");

    let auth_service = Arc::new(AuthService::new(config.auth.clone())?);
    match auth_service.mode() {
        AuthMode::None => {
            info!(
                "🔓 Authentication is disabled - API requests run as '{}'",
                config.auth.default_user
            );
        }
        AuthMode::Jwt => {
            info!("🔐 JWT bearer authentication enabled");
        }
    }

    let service = UrlService::new(storage);

    let api_router = api::create_api_router(service.clone(), auth_service, &config.cors);
    let redirect_router =
        redirect::create_redirect_router(service, config.redirect.status_code());

    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API server to {api_addr}"))?;
    info!("🚀 API server listening on http://{}", api_addr);
    info!("   - API endpoints available at http://{}/api/...", api_addr);

    let redirect_addr = format!(
        "{}:{}",
        config.redirect_server.host, config.redirect_server.port
    );
    let redirect_listener = tokio::net::TcpListener::bind(&redirect_addr)
        .await
        .with_context(|| format!("failed to bind redirect server to {redirect_addr}"))?;
    info!(
        "🚀 Redirect server listening on http://{} (status {})",
        redirect_addr, config.redirect.status
    );

    // Run both servers concurrently
    tokio::try_join!(
        axum::serve(api_listener, api_router).into_future(),
        axum::serve(redirect_listener, redirect_router).into_future(),
    )?;

    Ok(())
}
