use crate::{traits::RoleRepository, DatabasePool};
use async_trait::async_trait;
use catalog_core::domain::Role;
use catalog_core::{CatalogResult, RoleId};
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

const SELECT_ROLE: &str = "SELECT r.id, r.name, r.description, r.is_system, \
            COALESCE(array_agg(p.name ORDER BY p.name) FILTER (WHERE p.name IS NOT NULL), '{}') AS permissions \
     FROM roles r \
     LEFT JOIN role_permissions rp ON rp.role_id = r.id \
     LEFT JOIN permissions p ON p.id = rp.permission_id";

/// PostgreSQL role repository implementation.
#[derive(Clone)]
pub struct PgRoleRepository {
    pool: Arc<DatabasePool>,
}

impl PgRoleRepository {
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    is_system: bool,
    permissions: Vec<String>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: RoleId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            is_system: row.is_system,
            permissions: row.permissions,
        }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn find_all(&self) -> CatalogResult<Vec<Role>> {
        let sql = format!("{SELECT_ROLE} GROUP BY r.id ORDER BY r.name");
        let rows = sqlx::query_as::<_, RoleRow>(&sql).fetch_all(self.pool.inner()).await?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn find_by_name(&self, name: &str) -> CatalogResult<Option<Role>> {
        let sql = format!("{SELECT_ROLE} WHERE r.name = $1 GROUP BY r.id");
        let row = sqlx::query_as::<_, RoleRow>(&sql)
            .bind(name)
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(row.map(Role::from))
    }
}
