//! JWT claims extractor.

use crate::middleware::TokenRejection;
use crate::responses::AppError;
use catalog_core::CatalogError;
use catalog_security::Claims;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Claims of the caller, placed in the request extensions by the auth
/// middleware.
///
/// Rejects with 401 when no token was sent or the token did not validate.
pub struct AuthenticatedUser(pub Claims);

impl std::ops::Deref for AuthenticatedUser {
    type Target = Claims;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(AuthenticatedUser(claims.clone()));
        }

        let error = match parts.extensions.get::<TokenRejection>() {
            Some(TokenRejection::Expired) => CatalogError::TokenExpired,
            Some(TokenRejection::Invalid(reason)) => CatalogError::InvalidToken(reason.clone()),
            None => CatalogError::unauthorized("Missing bearer token"),
        };
        Err(AppError(error))
    }
}
