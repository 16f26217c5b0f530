//! JWT token provider for creating and validating tokens.

use super::{Claims, TokenType};
use catalog_config::SecurityConfig;
use catalog_core::domain::User;
use catalog_core::{CatalogError, CatalogResult};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Token pair containing access and refresh tokens.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub access_expires_at: i64,
    pub refresh_expires_at: i64,
}

/// JWT token provider service (HS256).
#[derive(Clone)]
pub struct TokenProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: Arc<SecurityConfig>,
    validation: Validation,
}

impl TokenProvider {
    #[must_use]
    pub fn new(config: Arc<SecurityConfig>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.jwt_issuer]);
        validation.set_audience(&[&config.jwt_audience]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        Self {
            encoding_key,
            decoding_key,
            config,
            validation,
        }
    }

    /// Generates an access/refresh pair for a user.
    pub fn generate_tokens(&self, user: &User, permissions: &[String]) -> CatalogResult<TokenPair> {
        let access_ttl = self.config.jwt_access_expiration_secs;
        let refresh_ttl = self.config.jwt_refresh_expiration_secs;

        let (access_token, access_expires_at) = self.sign(user, permissions, TokenType::Access, access_ttl)?;
        // Refresh tokens carry no permissions; they are reloaded on refresh.
        let (refresh_token, refresh_expires_at) = self.sign(user, &[], TokenType::Refresh, refresh_ttl)?;

        debug!(user_id = %user.id, "Generated token pair");
        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: access_ttl,
            access_expires_at,
            refresh_expires_at,
        })
    }

    fn sign(
        &self,
        user: &User,
        permissions: &[String],
        token_type: TokenType,
        ttl_secs: u64,
    ) -> CatalogResult<(String, i64)> {
        let expires_at = Utc::now() + Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX / 1000));
        let claims = Claims::for_user(
            user,
            permissions,
            token_type,
            self.config.jwt_issuer.clone(),
            self.config.jwt_audience.clone(),
            expires_at,
        );

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| CatalogError::Internal(format!("Failed to generate {token_type} token: {e}")))?;
        Ok((token, claims.exp))
    }

    /// Validates signature, issuer, audience and expiry.
    pub fn validate_token(&self, token: &str) -> CatalogResult<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            warn!("Token validation failed: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => CatalogError::TokenExpired,
                ErrorKind::InvalidToken | ErrorKind::InvalidSignature => {
                    CatalogError::InvalidToken("Invalid token signature".to_string())
                }
                ErrorKind::InvalidIssuer => CatalogError::InvalidToken("Invalid token issuer".to_string()),
                ErrorKind::InvalidAudience => CatalogError::InvalidToken("Invalid token audience".to_string()),
                _ => CatalogError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    pub fn validate_access_token(&self, token: &str) -> CatalogResult<Claims> {
        let claims = self.validate_token(token)?;
        if !claims.is_access_token() {
            return Err(CatalogError::InvalidToken("Expected access token".to_string()));
        }
        Ok(claims)
    }

    pub fn validate_refresh_token(&self, token: &str) -> CatalogResult<Claims> {
        let claims = self.validate_token(token)?;
        if !claims.is_refresh_token() {
            return Err(CatalogError::InvalidToken("Expected refresh token".to_string()));
        }
        Ok(claims)
    }

    #[must_use]
    pub fn access_token_ttl_secs(&self) -> u64 {
        self.config.jwt_access_expiration_secs
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("issuer", &self.config.jwt_issuer)
            .field("audience", &self.config.jwt_audience)
            .finish_non_exhaustive()
    }
}
