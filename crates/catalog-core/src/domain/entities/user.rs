//! User entity.

use crate::domain::value_objects::{Email, RoleName};
use crate::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account able to authenticate against the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub username: String,

    /// Argon2 hash; never exposed via the API.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,

    /// Role names, e.g. `MANAGER`.
    pub roles: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates an active, unverified user holding the default role.
    #[must_use]
    pub fn new(
        username: String,
        email: Email,
        password_hash: String,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            email,
            username,
            password_hash,
            first_name,
            last_name,
            is_active: true,
            is_verified: false,
            last_login_at: None,
            roles: vec![RoleName::DEFAULT.to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the user's full name.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }

    /// Records a successful login.
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    #[must_use]
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }

    /// Checks for `ADMIN` or `SUPER_ADMIN`.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_any_role(&[RoleName::Admin.as_str(), RoleName::SuperAdmin.as_str()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user() -> User {
        User::new(
            "testuser".to_string(),
            Email::new_unchecked("test@example.com"),
            "hash".to_string(),
            Some("John".to_string()),
            Some("Doe".to_string()),
        )
    }

    #[test]
    fn test_user_creation() {
        let user = create_test_user();
        assert_eq!(user.username, "testuser");
        assert!(user.is_active);
        assert!(!user.is_verified);
        assert_eq!(user.roles, vec!["USER".to_string()]);
        assert!(user.last_login_at.is_none());
    }

    #[test]
    fn test_full_name() {
        let mut user = create_test_user();
        assert_eq!(user.full_name(), Some("John Doe".to_string()));
        user.last_name = None;
        assert_eq!(user.full_name(), Some("John".to_string()));
        user.first_name = None;
        assert_eq!(user.full_name(), None);
    }

    #[test]
    fn test_roles() {
        let mut user = create_test_user();
        assert!(user.has_role("user"));
        assert!(!user.is_admin());
        user.roles.push("ADMIN".to_string());
        assert!(user.has_any_role(&["GUEST", "ADMIN"]));
        assert!(user.is_admin());
    }

    #[test]
    fn test_record_login_and_deactivate() {
        let mut user = create_test_user();
        user.record_login();
        assert!(user.last_login_at.is_some());
        user.deactivate();
        assert!(!user.is_active);
        user.activate();
        assert!(user.is_active);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_string(&create_test_user()).unwrap();
        assert!(!json.contains("password_hash"));
    }
}
