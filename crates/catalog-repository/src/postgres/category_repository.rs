//! PostgreSQL category repository over `ltree` paths.

use super::{corrupt, optional_pattern};
use crate::{traits::CategoryRepository, DatabasePool};
use async_trait::async_trait;
use catalog_core::domain::{Category, CategoryPath, SeoData, Slug};
use catalog_core::{CatalogError, CatalogResult, CategoryId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Advisory lock held by every subtree move.
const MOVE_LOCK_KEY: i64 = 0x0063_6174_616c_6f67;

const COLUMNS: &str = "id, name, slug, description, parent_id, path::text AS path, meta_title, \
     meta_description, meta_keywords, is_active, sort_order, created_at, updated_at";

/// PostgreSQL category repository implementation.
#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: Arc<DatabasePool>,
}

impl PgCategoryRepository {
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    async fn fetch_many(&self, sql: &str, bind: Option<&str>) -> CatalogResult<Vec<Category>> {
        let mut query = sqlx::query_as::<_, CategoryRow>(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        query
            .fetch_all(self.pool.inner())
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    parent_id: Option<Uuid>,
    path: String,
    meta_title: Option<String>,
    meta_description: Option<String>,
    meta_keywords: Option<String>,
    is_active: bool,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = CatalogError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Category {
            id: CategoryId::from_uuid(row.id),
            name: row.name,
            slug: Slug::new(&row.slug).map_err(|e| corrupt("slug", e))?,
            description: row.description,
            parent_id: row.parent_id.map(CategoryId::from_uuid),
            path: CategoryPath::parse(row.path).map_err(|e| corrupt("path", e))?,
            seo: SeoData {
                title: row.meta_title,
                description: row.meta_description,
                keywords: row.meta_keywords,
            },
            is_active: row.is_active,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_by_id(&self, id: CategoryId) -> CatalogResult<Option<Category>> {
        debug!(category_id = %id, "Finding category by id");
        let sql = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Category::try_from).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> CatalogResult<Option<Category>> {
        debug!(slug, "Finding category by slug");
        let sql = format!("SELECT {COLUMNS} FROM categories WHERE slug = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Category::try_from).transpose()
    }

    async fn find_all(&self, active_only: bool, search: Option<&str>) -> CatalogResult<Vec<Category>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM categories \
             WHERE ($1 = FALSE OR is_active) \
               AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2) \
             ORDER BY path, sort_order"
        );
        sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(active_only)
            .bind(optional_pattern(search))
            .fetch_all(self.pool.inner())
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    async fn find_roots(&self) -> CatalogResult<Vec<Category>> {
        let sql = format!("SELECT {COLUMNS} FROM categories WHERE parent_id IS NULL ORDER BY sort_order, name");
        self.fetch_many(&sql, None).await
    }

    async fn find_children(&self, id: CategoryId) -> CatalogResult<Vec<Category>> {
        let sql = format!("SELECT {COLUMNS} FROM categories WHERE parent_id = $1 ORDER BY sort_order, name");
        sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id.into_inner())
            .fetch_all(self.pool.inner())
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    async fn find_descendants(&self, path: &CategoryPath) -> CatalogResult<Vec<Category>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM categories \
             WHERE path <@ $1::ltree AND path <> $1::ltree \
             ORDER BY path, sort_order"
        );
        self.fetch_many(&sql, Some(path.as_str())).await
    }

    async fn find_ancestors(&self, path: &CategoryPath) -> CatalogResult<Vec<Category>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM categories \
             WHERE path @> $1::ltree AND path <> $1::ltree \
             ORDER BY nlevel(path)"
        );
        self.fetch_many(&sql, Some(path.as_str())).await
    }

    async fn exists_by_slug(&self, slug: &str, exclude: Option<CategoryId>) -> CatalogResult<bool> {
        let result: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM categories WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2) LIMIT 1",
        )
        .bind(slug)
        .bind(exclude.map(CategoryId::into_inner))
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(result.is_some())
    }

    async fn save(&self, category: &Category) -> CatalogResult<Category> {
        debug!(category_id = %category.id, path = %category.path, "Saving category");
        let sql = format!(
            "INSERT INTO categories (id, name, slug, description, parent_id, path, meta_title, \
                 meta_description, meta_keywords, is_active, sort_order, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6::ltree, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(category.id.into_inner())
            .bind(&category.name)
            .bind(category.slug.as_str())
            .bind(&category.description)
            .bind(category.parent_id.map(CategoryId::into_inner))
            .bind(category.path.as_str())
            .bind(&category.seo.title)
            .bind(&category.seo.description)
            .bind(&category.seo.keywords)
            .bind(category.is_active)
            .bind(category.sort_order)
            .bind(category.created_at)
            .bind(category.updated_at)
            .fetch_one(self.pool.inner())
            .await?;
        Category::try_from(row)
    }

    async fn update(&self, category: &Category) -> CatalogResult<Category> {
        debug!(category_id = %category.id, "Updating category");
        let sql = format!(
            "UPDATE categories SET name = $2, slug = $3, description = $4, meta_title = $5, \
                 meta_description = $6, meta_keywords = $7, is_active = $8, sort_order = $9 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(category.id.into_inner())
            .bind(&category.name)
            .bind(category.slug.as_str())
            .bind(&category.description)
            .bind(&category.seo.title)
            .bind(&category.seo.description)
            .bind(&category.seo.keywords)
            .bind(category.is_active)
            .bind(category.sort_order)
            .fetch_optional(self.pool.inner())
            .await?
            .ok_or_else(|| CatalogError::not_found("Category", category.id))?;
        Category::try_from(row)
    }

    async fn move_subtree(&self, id: CategoryId, new_parent_id: Option<CategoryId>) -> CatalogResult<Vec<Category>> {
        let mut tx = self.pool.inner().begin().await?;

        // The cycle check reads the new parent's path, which any other move
        // of one of its ancestors would rewrite.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(MOVE_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let lock_sql = format!("SELECT {COLUMNS} FROM categories WHERE id = ANY($1) ORDER BY id FOR UPDATE");
        let locked_ids: Vec<Uuid> = std::iter::once(id).chain(new_parent_id).map(CategoryId::into_inner).collect();
        let mut locked = sqlx::query_as::<_, CategoryRow>(&lock_sql)
            .bind(locked_ids)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect::<CatalogResult<Vec<_>>>()?;

        let position = locked
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CatalogError::not_found("Category", id))?;
        let mut category = locked.swap_remove(position);
        let parent = match new_parent_id {
            Some(parent_id) if parent_id == id => Some(category.clone()),
            Some(parent_id) => Some(
                locked
                    .into_iter()
                    .find(|c| c.id == parent_id)
                    .ok_or_else(|| CatalogError::not_found("Category", parent_id))?,
            ),
            None => None,
        };

        let old_path = category.path.clone();
        category.move_under(parent.as_ref())?;
        debug!(category_id = %id, from = %old_path, to = %category.path, "Moving category subtree");

        let updated = sqlx::query("UPDATE categories SET parent_id = $2 WHERE id = $1")
            .bind(id.into_inner())
            .bind(new_parent_id.map(CategoryId::into_inner))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated != 1 {
            return Err(CatalogError::not_found("Category", id));
        }

        sqlx::query(
            "UPDATE categories \
             SET path = CASE WHEN path = $1::ltree THEN $2::ltree \
                             ELSE $2::ltree || subpath(path, nlevel($1::ltree)) END \
             WHERE path <@ $1::ltree",
        )
        .bind(old_path.as_str())
        .bind(category.path.as_str())
        .execute(&mut *tx)
        .await?;

        let subtree_sql = format!(
            "SELECT {COLUMNS} FROM categories WHERE path <@ $1::ltree ORDER BY nlevel(path), path"
        );
        let moved = sqlx::query_as::<_, CategoryRow>(&subtree_sql)
            .bind(category.path.as_str())
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect::<CatalogResult<Vec<_>>>()?;

        tx.commit().await?;
        Ok(moved)
    }

    async fn delete(&self, id: CategoryId) -> CatalogResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_children(&self, id: CategoryId) -> CatalogResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE parent_id = $1")
            .bind(id.into_inner())
            .fetch_one(self.pool.inner())
            .await?;
        Ok(count)
    }

    async fn count_products(&self, id: CategoryId) -> CatalogResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id.into_inner())
            .fetch_one(self.pool.inner())
            .await?;
        Ok(count)
    }
}
