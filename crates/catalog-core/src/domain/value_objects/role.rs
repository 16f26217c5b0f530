//! RBAC role and permission value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Built-in roles seeded by the initial migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleName {
    SuperAdmin,
    Admin,
    Manager,
    User,
    Guest,
}

impl RoleName {
    /// Role assigned to self-registered accounts.
    pub const DEFAULT: Self = Self::User;

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::User => "USER",
            Self::Guest => "GUEST",
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 5] {
        [Self::SuperAdmin, Self::Admin, Self::Manager, Self::User, Self::Guest]
    }

    /// Permissions granted to the role out of the box.
    #[must_use]
    pub const fn default_permissions(&self) -> &'static [&'static str] {
        match self {
            Self::SuperAdmin => &["*"],
            Self::Admin => &[
                "users.*",
                "roles.*",
                "permissions.*",
                "categories.*",
                "products.*",
                "attributes.*",
                "cache.manage",
                "system.admin",
            ],
            Self::Manager => &[
                "categories.create",
                "categories.read",
                "categories.update",
                "products.create",
                "products.read",
                "products.update",
                "attributes.create",
                "attributes.read",
                "attributes.update",
                "users.read",
            ],
            Self::User => &["categories.read", "products.read", "attributes.read"],
            Self::Guest => &["categories.read", "products.read"],
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            "ADMIN" => Ok(Self::Admin),
            "MANAGER" => Ok(Self::Manager),
            "USER" => Ok(Self::User),
            "GUEST" => Ok(Self::Guest),
            other => Err(PermissionError::UnknownRole(other.to_string())),
        }
    }
}

/// Error for malformed permission or role names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermissionError {
    #[error("permission name must be 'resource.action' or '*', got '{0}'")]
    InvalidFormat(String),
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

/// A permission of the form `resource.action`, `resource.*` or `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(String);

impl Permission {
    /// The wildcard granting everything.
    pub const WILDCARD: &'static str = "*";

    /// Parses and normalizes (trim + lowercase) a permission name.
    pub fn new(name: impl AsRef<str>) -> Result<Self, PermissionError> {
        let name = name.as_ref().trim().to_lowercase();
        if name == Self::WILDCARD {
            return Ok(Self(name));
        }
        let valid = (2..=100).contains(&name.len())
            && name
                .split_once('.')
                .is_some_and(|(resource, action)| !resource.is_empty() && !action.is_empty());
        if valid {
            Ok(Self(name))
        } else {
            Err(PermissionError::InvalidFormat(name))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource part; `all` for the wildcard.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.0.split_once('.').map_or("all", |(resource, _)| resource)
    }

    /// Action part; `all` for the wildcard.
    #[must_use]
    pub fn action(&self) -> &str {
        self.0.split_once('.').map_or("all", |(_, action)| action)
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0 == Self::WILDCARD
    }

    /// True for `resource.*`.
    #[must_use]
    pub fn is_resource_wildcard(&self) -> bool {
        !self.is_wildcard() && self.action() == "*"
    }

    /// Checks whether this granted permission covers `required`.
    #[must_use]
    pub fn matches(&self, required: &str) -> bool {
        let required = required.trim().to_lowercase();
        if self.is_wildcard() || self.0 == required {
            return true;
        }
        self.is_resource_wildcard()
            && required.split_once('.').map_or(required.as_str(), |(r, _)| r) == self.resource()
    }
}

/// Checks a required permission against a set of granted permission names.
#[must_use]
pub fn permits<S: AsRef<str>>(granted: &[S], required: &str) -> bool {
    granted
        .iter()
        .filter_map(|p| Permission::new(p).ok())
        .any(|p| p.matches(required))
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Permission> for String {
    fn from(p: Permission) -> Self {
        p.0
    }
}

/// Permission names checked by the API.
pub mod permissions {
    pub const CATEGORIES_READ: &str = "categories.read";
    pub const CATEGORIES_CREATE: &str = "categories.create";
    pub const CATEGORIES_UPDATE: &str = "categories.update";
    pub const CATEGORIES_DELETE: &str = "categories.delete";
    pub const PRODUCTS_READ: &str = "products.read";
    pub const PRODUCTS_CREATE: &str = "products.create";
    pub const PRODUCTS_UPDATE: &str = "products.update";
    pub const PRODUCTS_DELETE: &str = "products.delete";
    pub const ATTRIBUTES_READ: &str = "attributes.read";
    pub const ATTRIBUTES_CREATE: &str = "attributes.create";
    pub const ATTRIBUTES_UPDATE: &str = "attributes.update";
    pub const ATTRIBUTES_DELETE: &str = "attributes.delete";
    pub const USERS_READ: &str = "users.read";
    pub const USERS_UPDATE: &str = "users.update";
    pub const CACHE_MANAGE: &str = "cache.manage";
}
