use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_server: ServerConfig,
    pub redirect_server: ServerConfig,
    pub redirect: RedirectConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// HTTP status used for redirects: 301, 302, 307 or 308
    pub status: u16,
}

impl RedirectConfig {
    pub const DEFAULT_STATUS: u16 = 302;
    const ALLOWED_STATUSES: [u16; 4] = [301, 302, 307, 308];

    /// Configured status as an HTTP status code
    pub fn status_code(&self) -> axum::http::StatusCode {
        axum::http::StatusCode::from_u16(self.status)
            .ok()
            .filter(|code| code.is_redirection())
            .unwrap_or(axum::http::StatusCode::FOUND)
    }

    fn parse_status(raw: &str) -> u16 {
        match raw.trim().parse::<u16>() {
            Ok(status) if Self::ALLOWED_STATUSES.contains(&status) => status,
            _ => {
                tracing::warn!(
                    "Unsupported REDIRECT_STATUS '{raw}', falling back to {}. Supported values: 301, 302, 307, 308",
                    Self::DEFAULT_STATUS
                );
                Self::DEFAULT_STATUS
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    None,
    Jwt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    /// HMAC secret for HS256 bearer tokens, required in `jwt` mode
    #[serde(default, skip_serializing)]
    pub jwt_secret: Option<String>,
    /// Principal every request runs as when authentication is disabled
    #[serde(default = "AuthConfig::default_user")]
    pub default_user: String,
}

impl AuthConfig {
    pub fn default_user() -> String {
        "anonymous".to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API with credentials
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./tinytrail.db?mode=rwc".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?
            .max(1);

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port")?;

        let redirect_host =
            std::env::var("REDIRECT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let redirect_port = std::env::var("REDIRECT_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("REDIRECT_PORT must be a valid port")?;

        let redirect_status = std::env::var("REDIRECT_STATUS")
            .map(|v| RedirectConfig::parse_status(&v))
            .unwrap_or(RedirectConfig::DEFAULT_STATUS);

        let disable_auth = std::env::var("DISABLE_AUTH")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let mut auth_mode = std::env::var("AUTH_MODE")
            .unwrap_or_else(|_| "none".to_string())
            .to_lowercase();

        if disable_auth {
            auth_mode = "none".to_string();
        }

        let auth_mode = match auth_mode.as_str() {
            "none" => AuthMode::None,
            "jwt" => AuthMode::Jwt,
            other => {
                tracing::warn!(
                    "Unknown AUTH_MODE '{other}', falling back to 'none'. Supported values: none, jwt"
                );
                AuthMode::None
            }
        };

        let jwt_secret = if matches!(auth_mode, AuthMode::Jwt) {
            let secret =
                std::env::var("JWT_SECRET").context("JWT_SECRET must be set when AUTH_MODE=jwt")?;
            if secret.is_empty() {
                anyhow::bail!("JWT_SECRET must not be empty when AUTH_MODE=jwt");
            }
            Some(secret)
        } else {
            None
        };

        let default_user =
            std::env::var("DEFAULT_USER").unwrap_or_else(|_| AuthConfig::default_user());

        let allowed_origins = parse_origins(
            &std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
        );

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            redirect_server: ServerConfig {
                host: redirect_host,
                port: redirect_port,
            },
            redirect: RedirectConfig {
                status: redirect_status,
            },
            auth: AuthConfig {
                mode: auth_mode,
                jwt_secret,
                default_user,
            },
            cors: CorsConfig { allowed_origins },
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
