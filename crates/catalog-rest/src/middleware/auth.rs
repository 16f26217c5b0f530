//! Authentication middleware.

use catalog_core::CatalogError;
use catalog_security::{Claims, TokenProvider};
use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub token_provider: Arc<TokenProvider>,
    /// When false every request runs as [`Claims::superuser`].
    pub auth_enabled: bool,
}

impl AuthMiddlewareState {
    pub fn new(token_provider: Arc<TokenProvider>, auth_enabled: bool) -> Self {
        Self {
            token_provider,
            auth_enabled,
        }
    }
}

/// Why a presented bearer token was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRejection {
    Expired,
    Invalid(String),
}

/// Validates the bearer token and stores the claims in the request
/// extensions.
///
/// Requests are never rejected here; handlers that need a principal use the
/// [`AuthenticatedUser`](crate::extractors::AuthenticatedUser) extractor,
/// which turns a stored [`TokenRejection`] into the matching 401.
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if !state.auth_enabled {
        request.extensions_mut().insert(Claims::superuser());
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim);

    if let Some(token) = token {
        match state.token_provider.validate_access_token(token) {
            Ok(claims) => {
                debug!("Authenticated user: {}", claims.username);
                request.extensions_mut().insert(claims);
            }
            Err(CatalogError::TokenExpired) => {
                debug!("Rejected expired token");
                request.extensions_mut().insert(TokenRejection::Expired);
            }
            Err(e) => {
                debug!("Token validation failed: {}", e);
                request.extensions_mut().insert(TokenRejection::Invalid(e.to_string()));
            }
        }
    }

    next.run(request).await
}
