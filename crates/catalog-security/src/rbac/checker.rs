//! RBAC permission checker.

use crate::Claims;
use catalog_core::domain::RoleName;
use catalog_core::{CatalogError, CatalogResult};

/// Extension trait for Claims to check permissions.
pub trait ClaimsExt {
    fn require_permission(&self, permission: &str) -> CatalogResult<()>;
}

impl ClaimsExt for Claims {
    fn require_permission(&self, permission: &str) -> CatalogResult<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(CatalogError::Forbidden(format!("Permission denied: {permission} required")))
        }
    }
}

/// Static view over the built-in role map.
pub struct PermissionChecker;

impl PermissionChecker {
    /// Default permissions of a built-in role.
    #[must_use]
    pub fn role_permissions(role: RoleName) -> Vec<String> {
        role.default_permissions().iter().map(|p| (*p).to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenType;
    use catalog_core::domain::{Email, User};
    use chrono::{Duration, Utc};

    fn create_claims(role: RoleName) -> Claims {
        let mut user = User::new(
            "testuser".to_string(),
            Email::new_unchecked("test@example.com"),
            "hash".to_string(),
            None,
            None,
        );
        user.roles = vec![role.to_string()];
        Claims::for_user(
            &user,
            &PermissionChecker::role_permissions(role),
            TokenType::Access,
            "issuer".to_string(),
            "audience".to_string(),
            Utc::now() + Duration::hours(1),
        )
    }

    #[test]
    fn test_require_permission() {
        let user = create_claims(RoleName::User);
        let manager = create_claims(RoleName::Manager);
        let admin = create_claims(RoleName::Admin);

        assert!(user.require_permission("products.read").is_ok());
        assert!(user.require_permission("products.create").is_err());
        assert!(manager.require_permission("products.update").is_ok());
        assert!(manager.require_permission("products.delete").is_err());
        assert!(admin.require_permission("products.delete").is_ok());
        assert!(admin.require_permission("cache.manage").is_ok());
    }

    #[test]
    fn test_super_admin_wildcard() {
        let super_admin = create_claims(RoleName::SuperAdmin);
        assert!(super_admin.require_permission("anything.at_all").is_ok());
    }

    #[test]
    fn test_denied_message_names_permission() {
        let err = create_claims(RoleName::Guest).require_permission("cache.manage").unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(err.to_string().contains("cache.manage"));
    }

    #[test]
    fn test_role_permissions() {
        let guest = PermissionChecker::role_permissions(RoleName::Guest);
        assert!(guest.iter().all(|p| p.ends_with(".read")));
        assert!(PermissionChecker::role_permissions(RoleName::Manager).contains(&"products.update".to_string()));
    }
}
