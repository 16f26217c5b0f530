//! JWT claims structure.

use catalog_core::domain::{permits, RoleName, User};
use catalog_core::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure.
///
/// Roles and the flattened permission list are embedded so requests can be
/// authorized without a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,

    pub username: String,

    pub email: String,

    /// Role names, e.g. `MANAGER`.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Permission names granted through the roles.
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Token type (access or refresh).
    pub token_type: TokenType,

    /// Issued at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,

    /// Not before timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    pub iss: String,

    pub aud: String,

    /// JWT ID (unique identifier for this token).
    pub jti: String,
}

impl Claims {
    /// Creates claims for a user.
    #[must_use]
    pub fn for_user(
        user: &User,
        permissions: &[String],
        token_type: TokenType,
        issuer: String,
        audience: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.to_string(),
            roles: user.roles.clone(),
            permissions: permissions.to_vec(),
            token_type,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            nbf: Some(now.timestamp()),
            iss: issuer,
            aud: audience,
            jti: Uuid::now_v7().to_string(),
        }
    }

    /// Principal used when authentication is switched off: a super admin
    /// holding the `*` permission.
    #[must_use]
    pub fn superuser() -> Self {
        let now = Utc::now();
        Self {
            sub: Uuid::nil().to_string(),
            username: "system".to_string(),
            email: "system@localhost".to_string(),
            roles: vec![RoleName::SuperAdmin.to_string()],
            permissions: vec!["*".to_string()],
            token_type: TokenType::Access,
            iat: now.timestamp(),
            exp: i64::MAX,
            nbf: None,
            iss: "local".to_string(),
            aud: "local".to_string(),
            jti: Uuid::now_v7().to_string(),
        }
    }

    /// Returns the user ID parsed from the subject.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        UserId::parse(&self.sub).ok()
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Case-insensitive role membership.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Checks a permission, honouring `resource.*` and `*` grants.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        permits(&self.permissions, permission)
    }

    #[must_use]
    pub const fn is_access_token(&self) -> bool {
        matches!(self.token_type, TokenType::Access)
    }

    #[must_use]
    pub const fn is_refresh_token(&self) -> bool {
        matches!(self.token_type, TokenType::Refresh)
    }
}

/// Token type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived, used for API requests.
    Access,
    /// Long-lived, used to obtain new access tokens.
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::domain::Email;
    use chrono::Duration;

    fn user_with_roles(roles: &[&str]) -> User {
        let mut user = User::new(
            "testuser".to_string(),
            Email::new_unchecked("test@example.com"),
            "hash".to_string(),
            None,
            None,
        );
        user.roles = roles.iter().map(|r| (*r).to_string()).collect();
        user
    }

    fn claims(roles: &[&str], permissions: &[&str]) -> Claims {
        let permissions: Vec<String> = permissions.iter().map(|p| (*p).to_string()).collect();
        Claims::for_user(
            &user_with_roles(roles),
            &permissions,
            TokenType::Access,
            "issuer".to_string(),
            "audience".to_string(),
            Utc::now() + Duration::hours(1),
        )
    }

    #[test]
    fn test_access_token_claims() {
        let claims = claims(&["USER"], &["products.read"]);

        assert!(claims.is_access_token());
        assert!(!claims.is_refresh_token());
        assert!(!claims.is_expired());
        assert!(claims.user_id().is_some());
    }

    #[test]
    fn test_role_check_is_case_insensitive() {
        let claims = claims(&["MANAGER"], &[]);

        assert!(claims.has_role("manager"));
        assert!(!claims.has_role("ADMIN"));
    }

    #[test]
    fn test_permission_wildcards() {
        let claims = claims(&["ADMIN"], &["products.*", "cache.manage"]);

        assert!(claims.has_permission("products.delete"));
        assert!(claims.has_permission("cache.manage"));
        assert!(!claims.has_permission("categories.read"));
    }

    #[test]
    fn test_superuser_has_everything() {
        let claims = Claims::superuser();

        assert!(claims.has_permission("users.update"));
        assert!(claims.has_role("SUPER_ADMIN"));
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_token_type_display() {
        assert_eq!(TokenType::Access.to_string(), "access");
        assert_eq!(TokenType::Refresh.to_string(), "refresh");
    }
}
