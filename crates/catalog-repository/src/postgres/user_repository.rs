//! PostgreSQL user repository.

use crate::{traits::UserRepository, DatabasePool};
use async_trait::async_trait;
use catalog_core::domain::{Email, User};
use catalog_core::{CatalogResult, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const SELECT_USER: &str = "SELECT u.id, u.email, u.username, u.password_hash, u.first_name, u.last_name, \
            u.is_active, u.is_verified, u.last_login_at, u.created_at, u.updated_at, \
            COALESCE(array_agg(r.name ORDER BY r.name) FILTER (WHERE r.name IS NOT NULL), '{}') AS roles \
     FROM users u \
     LEFT JOIN user_roles ur ON ur.user_id = u.id \
     LEFT JOIN roles r ON r.id = ur.role_id";

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Arc<DatabasePool>,
}

impl PgUserRepository {
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    async fn find_where(&self, condition: &str, value: &str) -> CatalogResult<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE {condition} GROUP BY u.id");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(row.map(User::from))
    }

    async fn link_roles<'c>(
        tx: &mut sqlx::Transaction<'c, sqlx::Postgres>,
        user_id: Uuid,
        role_names: &[String],
    ) -> CatalogResult<()> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) \
             SELECT $1, id FROM roles WHERE name = ANY($2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_names)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    username: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    is_active: bool,
    is_verified: bool,
    last_login_at: Option<DateTime<Utc>>,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            email: Email::new_unchecked(row.email),
            username: row.username,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
            is_verified: row.is_verified,
            last_login_at: row.last_login_at,
            roles: row.roles,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> CatalogResult<Option<User>> {
        debug!(user_id = %id, "Finding user by id");
        let sql = format!("{SELECT_USER} WHERE u.id = $1 GROUP BY u.id");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> CatalogResult<Option<User>> {
        self.find_where("u.username = $1", username).await
    }

    async fn find_by_email(&self, email: &str) -> CatalogResult<Option<User>> {
        self.find_where("LOWER(u.email) = LOWER($1)", email).await
    }

    async fn find_by_username_or_email(&self, identifier: &str) -> CatalogResult<Option<User>> {
        self.find_where("(u.username = $1 OR LOWER(u.email) = LOWER($1))", identifier)
            .await
    }

    async fn exists_by_username(&self, username: &str) -> CatalogResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(self.pool.inner())
            .await?;
        Ok(exists)
    }

    async fn exists_by_email(&self, email: &str) -> CatalogResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
            .bind(email)
            .fetch_one(self.pool.inner())
            .await?;
        Ok(exists)
    }

    async fn save(&self, user: &User) -> CatalogResult<User> {
        debug!(user_id = %user.id, username = %user.username, "Saving user");
        let mut tx = self.pool.inner().begin().await?;

        sqlx::query(
            "INSERT INTO users (id, email, username, password_hash, first_name, last_name, is_active, \
                 is_verified, last_login_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(user.id.into_inner())
        .bind(user.email.as_str())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::link_roles(&mut tx, user.id.into_inner(), &user.roles).await?;
        tx.commit().await?;

        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> CatalogResult<User> {
        debug!(user_id = %user.id, "Updating user");
        sqlx::query(
            "UPDATE users SET email = $2, username = $3, password_hash = $4, first_name = $5, \
                 last_name = $6, is_active = $7, is_verified = $8, last_login_at = $9 \
             WHERE id = $1",
        )
        .bind(user.id.into_inner())
        .bind(user.email.as_str())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.last_login_at)
        .execute(self.pool.inner())
        .await?;

        Ok(user.clone())
    }

    async fn assign_roles(&self, user_id: UserId, role_names: &[String]) -> CatalogResult<()> {
        let mut tx = self.pool.inner().begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id.into_inner())
            .execute(&mut *tx)
            .await?;
        Self::link_roles(&mut tx, user_id.into_inner(), role_names).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn permissions_for(&self, user_id: UserId) -> CatalogResult<Vec<String>> {
        let permissions: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT p.name \
             FROM user_roles ur \
             JOIN role_permissions rp ON rp.role_id = ur.role_id \
             JOIN permissions p ON p.id = rp.permission_id \
             WHERE ur.user_id = $1 \
             ORDER BY p.name",
        )
        .bind(user_id.into_inner())
        .fetch_all(self.pool.inner())
        .await?;
        Ok(permissions)
    }
}
