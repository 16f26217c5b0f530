//! Role entity.

use crate::domain::value_objects::permits;
use crate::RoleId;
use serde::{Deserialize, Serialize};

/// A named set of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    /// Seeded roles cannot be deleted.
    pub is_system: bool,
    pub permissions: Vec<String>,
}

impl Role {
    /// Wildcard-aware permission check.
    #[must_use]
    pub fn has_permission(&self, required: &str) -> bool {
        permits(&self.permissions, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::RoleName;

    #[test]
    fn test_has_permission() {
        let role = Role {
            id: RoleId::new(),
            name: RoleName::Manager.to_string(),
            description: None,
            is_system: true,
            permissions: RoleName::Manager
                .default_permissions()
                .iter()
                .map(ToString::to_string)
                .collect(),
        };
        assert!(role.has_permission("categories.update"));
        assert!(!role.has_permission("categories.delete"));
    }
}
