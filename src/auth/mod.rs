use anyhow::{anyhow, Context, Result};
use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::api::ApiError;
use crate::config::{AuthConfig, AuthMode};

/// Authenticated principal, inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthClaims {
    pub username: String,
}

/// Claims carried by bearer tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: u64,
}

pub struct AuthService {
    mode: AuthMode,
    default_user: String,
    decoding_key: Option<DecodingKey>,
    validation: Validation,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Result<Self> {
        let decoding_key = match config.mode {
            AuthMode::None => None,
            AuthMode::Jwt => {
                let secret = config
                    .jwt_secret
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .context("a JWT secret is required in jwt auth mode")?;
                Some(DecodingKey::from_secret(secret.as_bytes()))
            }
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_aud = false;

        Ok(Self {
            mode: config.mode,
            default_user: config.default_user,
            decoding_key,
            validation,
        })
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Establish the principal for a request from its headers
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthClaims> {
        let Some(key) = self.decoding_key.as_ref() else {
            return Ok(AuthClaims {
                username: self.default_user.clone(),
            });
        };

        let token = bearer_token(headers).ok_or_else(|| anyhow!("missing bearer token"))?;

        let data = decode::<TokenClaims>(token, key, &self.validation)
            .context("token failed signature or claim validation")?;

        let username = data.claims.sub.trim();
        if username.is_empty() {
            return Err(anyhow!("token has an empty 'sub' claim"));
        }

        Ok(AuthClaims {
            username: username.to_string(),
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub async fn auth_middleware(
    auth_service: Arc<AuthService>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    match auth_service.authenticate(&headers) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => {
            warn!(error = %err, path = %request.uri().path(), "rejected unauthenticated request");
            ApiError::Unauthenticated.into_response()
        }
    }
}
