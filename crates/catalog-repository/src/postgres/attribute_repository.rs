//! PostgreSQL attribute repository and category assignments.

use super::{corrupt, limit_offset, optional_pattern, page_of};
use crate::traits::{
    AssignedAttribute, AttributeAssignment, AttributeFilter, AttributeRepository, AttributeStatistics, AttributeUsage,
};
use crate::DatabasePool;
use async_trait::async_trait;
use catalog_core::domain::{Attribute, AttributeType, CategoryAttribute, Slug, ValidationRules};
use catalog_core::{
    AttributeId, AttributeSortField, CatalogError, CatalogResult, CategoryId, Page, PageRequest, Sort,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const COLUMNS: &str = "id, name, slug, description, value_type, validation_rules, default_value, unit, \
     group_name, is_required, is_filterable, is_searchable, sort_order, is_active, created_at, updated_at";

const FILTER_WHERE: &str = "WHERE ($1::text IS NULL OR value_type::text = $1) \
       AND ($2::boolean IS NULL OR is_required = $2) \
       AND ($3::boolean IS NULL OR is_filterable = $3) \
       AND ($4::boolean IS NULL OR is_searchable = $4) \
       AND ($5::boolean IS NULL OR is_active = $5) \
       AND ($6::text IS NULL OR name ILIKE $6 OR description ILIKE $6) \
       AND ($7::text IS NULL OR group_name = $7)";

/// PostgreSQL attribute repository implementation.
#[derive(Clone)]
pub struct PgAttributeRepository {
    pool: Arc<DatabasePool>,
}

impl PgAttributeRepository {
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> CatalogResult<Option<Attribute>> {
        let sql = format!("SELECT {COLUMNS} FROM attributes WHERE {column} = $1");
        let row = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Attribute::try_from).transpose()
    }
}

#[derive(Debug, FromRow)]
struct AttributeRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    value_type: AttributeType,
    validation_rules: Json<ValidationRules>,
    default_value: Option<Value>,
    unit: Option<String>,
    group_name: Option<String>,
    is_required: bool,
    is_filterable: bool,
    is_searchable: bool,
    sort_order: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct AssignedRow {
    #[sqlx(flatten)]
    attribute: AttributeRow,
    link_inherited: bool,
    link_inherit_to_descendants: bool,
    link_sort_order: i32,
}

impl TryFrom<AttributeRow> for Attribute {
    type Error = CatalogError;

    fn try_from(row: AttributeRow) -> Result<Self, Self::Error> {
        Ok(Attribute {
            id: AttributeId::from_uuid(row.id),
            name: row.name,
            slug: Slug::new(&row.slug).map_err(|e| corrupt("slug", e))?,
            description: row.description,
            value_type: row.value_type,
            rules: row.validation_rules.0,
            default_value: row.default_value,
            unit: row.unit,
            group_name: row.group_name,
            is_required: row.is_required,
            is_filterable: row.is_filterable,
            is_searchable: row.is_searchable,
            sort_order: row.sort_order,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl AttributeRepository for PgAttributeRepository {
    async fn find_by_id(&self, id: AttributeId) -> CatalogResult<Option<Attribute>> {
        let sql = format!("SELECT {COLUMNS} FROM attributes WHERE id = $1");
        let row = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Attribute::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> CatalogResult<Option<Attribute>> {
        self.find_one("name", name).await
    }

    async fn find_by_slug(&self, slug: &str) -> CatalogResult<Option<Attribute>> {
        self.find_one("slug", slug).await
    }

    async fn find_by_ids(&self, ids: &[AttributeId]) -> CatalogResult<Vec<Attribute>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        let sql = format!("SELECT {COLUMNS} FROM attributes WHERE id = ANY($1) ORDER BY sort_order, name");
        sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(ids)
            .fetch_all(self.pool.inner())
            .await?
            .into_iter()
            .map(Attribute::try_from)
            .collect()
    }

    async fn find_all(
        &self,
        filter: &AttributeFilter,
        page: PageRequest,
        sort: Sort<AttributeSortField>,
    ) -> CatalogResult<Page<Attribute>> {
        let value_type = filter.value_type.map(|t| t.as_str());
        let pattern = optional_pattern(filter.search.as_deref());

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM attributes {FILTER_WHERE}"))
            .bind(value_type)
            .bind(filter.is_required)
            .bind(filter.is_filterable)
            .bind(filter.is_searchable)
            .bind(filter.is_active)
            .bind(&pattern)
            .bind(&filter.group_name)
            .fetch_one(self.pool.inner())
            .await?;

        let (limit, offset) = limit_offset(page);
        let sql = format!(
            "SELECT {COLUMNS} FROM attributes {FILTER_WHERE} ORDER BY {} {}, name LIMIT $8 OFFSET $9",
            sort.field.column(),
            sort.order.as_sql()
        );
        let rows = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(value_type)
            .bind(filter.is_required)
            .bind(filter.is_filterable)
            .bind(filter.is_searchable)
            .bind(filter.is_active)
            .bind(&pattern)
            .bind(&filter.group_name)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.inner())
            .await?;

        let content = rows.into_iter().map(Attribute::try_from).collect::<CatalogResult<Vec<_>>>()?;
        Ok(page_of(content, page, total))
    }

    async fn save(&self, attribute: &Attribute) -> CatalogResult<Attribute> {
        debug!(attribute_id = %attribute.id, name = %attribute.name, "Saving attribute");
        let sql = format!(
            "INSERT INTO attributes (id, name, slug, description, value_type, validation_rules, default_value, \
                 unit, group_name, is_required, is_filterable, is_searchable, sort_order, is_active, \
                 created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(attribute.id.into_inner())
            .bind(&attribute.name)
            .bind(attribute.slug.as_str())
            .bind(&attribute.description)
            .bind(attribute.value_type)
            .bind(Json(&attribute.rules))
            .bind(&attribute.default_value)
            .bind(&attribute.unit)
            .bind(&attribute.group_name)
            .bind(attribute.is_required)
            .bind(attribute.is_filterable)
            .bind(attribute.is_searchable)
            .bind(attribute.sort_order)
            .bind(attribute.is_active)
            .bind(attribute.created_at)
            .bind(attribute.updated_at)
            .fetch_one(self.pool.inner())
            .await?;
        Attribute::try_from(row)
    }

    async fn update(&self, attribute: &Attribute) -> CatalogResult<Attribute> {
        debug!(attribute_id = %attribute.id, "Updating attribute");
        let sql = format!(
            "UPDATE attributes SET name = $2, slug = $3, description = $4, value_type = $5, \
                 validation_rules = $6, default_value = $7, unit = $8, group_name = $9, is_required = $10, \
                 is_filterable = $11, is_searchable = $12, sort_order = $13, is_active = $14 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(attribute.id.into_inner())
            .bind(&attribute.name)
            .bind(attribute.slug.as_str())
            .bind(&attribute.description)
            .bind(attribute.value_type)
            .bind(Json(&attribute.rules))
            .bind(&attribute.default_value)
            .bind(&attribute.unit)
            .bind(&attribute.group_name)
            .bind(attribute.is_required)
            .bind(attribute.is_filterable)
            .bind(attribute.is_searchable)
            .bind(attribute.sort_order)
            .bind(attribute.is_active)
            .fetch_optional(self.pool.inner())
            .await?
            .ok_or_else(|| CatalogError::not_found("Attribute", attribute.id))?;
        Attribute::try_from(row)
    }

    async fn delete(&self, id: AttributeId) -> CatalogResult<bool> {
        let result = sqlx::query("DELETE FROM attributes WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn usage_count(&self, id: AttributeId) -> CatalogResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_attributes WHERE attribute_id = $1")
            .bind(id.into_inner())
            .fetch_one(self.pool.inner())
            .await?;
        Ok(count)
    }

    async fn find_all_by_group(&self) -> CatalogResult<Vec<Attribute>> {
        let sql = format!("SELECT {COLUMNS} FROM attributes ORDER BY group_name NULLS FIRST, sort_order, name");
        sqlx::query_as::<_, AttributeRow>(&sql)
            .fetch_all(self.pool.inner())
            .await?
            .into_iter()
            .map(Attribute::try_from)
            .collect()
    }

    async fn categories_count(&self, id: AttributeId) -> CatalogResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM category_attributes WHERE attribute_id = $1")
            .bind(id.into_inner())
            .fetch_one(self.pool.inner())
            .await?;
        Ok(count)
    }

    async fn assign_to_category(
        &self,
        category_id: CategoryId,
        assignments: &[AttributeAssignment],
    ) -> CatalogResult<()> {
        debug!(category_id = %category_id, count = assignments.len(), "Assigning attributes to category");
        let mut tx = self.pool.inner().begin().await?;

        for assignment in assignments {
            sqlx::query(
                "INSERT INTO category_attributes (category_id, attribute_id, inherit_to_descendants, sort_order) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (category_id, attribute_id) \
                 DO UPDATE SET inherit_to_descendants = EXCLUDED.inherit_to_descendants, \
                               sort_order = EXCLUDED.sort_order",
            )
            .bind(category_id.into_inner())
            .bind(assignment.attribute_id.into_inner())
            .bind(assignment.inherit_to_descendants)
            .bind(assignment.sort_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn unassign_from_category(&self, category_id: CategoryId, attribute_id: AttributeId) -> CatalogResult<bool> {
        let removed = sqlx::query("DELETE FROM category_attributes WHERE category_id = $1 AND attribute_id = $2")
            .bind(category_id.into_inner())
            .bind(attribute_id.into_inner())
            .execute(self.pool.inner())
            .await?
            .rows_affected();
        debug!(category_id = %category_id, attribute_id = %attribute_id, removed, "Unassigned attribute");
        Ok(removed > 0)
    }

    async fn find_for_category(&self, category_id: CategoryId) -> CatalogResult<Vec<AssignedAttribute>> {
        let rows = sqlx::query_as::<_, AssignedRow>(
            "SELECT * FROM ( \
                 SELECT DISTINCT ON (a.id) \
                        a.id, a.name, a.slug, a.description, a.value_type, a.validation_rules, \
                        a.default_value, a.unit, a.group_name, a.is_required, a.is_filterable, \
                        a.is_searchable, a.sort_order, a.is_active, a.created_at, a.updated_at, \
                        ca.category_id <> target.id AS link_inherited, \
                        ca.inherit_to_descendants AS link_inherit_to_descendants, \
                        ca.sort_order AS link_sort_order \
                 FROM categories target \
                 JOIN categories c ON c.path @> target.path \
                 JOIN category_attributes ca ON ca.category_id = c.id \
                 JOIN attributes a ON a.id = ca.attribute_id \
                 WHERE target.id = $1 AND a.is_active \
                   AND (c.id = target.id OR ca.inherit_to_descendants) \
                 ORDER BY a.id, nlevel(c.path) DESC \
             ) assigned \
             ORDER BY link_sort_order, name",
        )
        .bind(category_id.into_inner())
        .fetch_all(self.pool.inner())
        .await?;

        rows.into_iter()
            .map(|row| {
                let attribute = Attribute::try_from(row.attribute)?;
                Ok(AssignedAttribute {
                    link: CategoryAttribute {
                        category_id,
                        attribute_id: attribute.id,
                        is_inherited: row.link_inherited,
                        inherit_to_descendants: row.link_inherit_to_descendants,
                        sort_order: row.link_sort_order,
                    },
                    attribute,
                })
            })
            .collect()
    }

    async fn statistics(&self) -> CatalogResult<AttributeStatistics> {
        let (total, required, filterable, searchable): (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), \
                    COUNT(*) FILTER (WHERE is_required), \
                    COUNT(*) FILTER (WHERE is_filterable), \
                    COUNT(*) FILTER (WHERE is_searchable) \
             FROM attributes",
        )
        .fetch_one(self.pool.inner())
        .await?;

        let by_type: Vec<(String, i64)> = sqlx::query_as(
            "SELECT value_type::text, COUNT(*) FROM attributes GROUP BY value_type ORDER BY value_type::text",
        )
        .fetch_all(self.pool.inner())
        .await?;

        let most_used: Vec<(Uuid, String, i64)> = sqlx::query_as(
            "SELECT a.id, a.name, COUNT(pa.product_id) AS usage_count \
             FROM attributes a \
             LEFT JOIN product_attributes pa ON pa.attribute_id = a.id \
             GROUP BY a.id, a.name \
             ORDER BY usage_count DESC, a.name \
             LIMIT 10",
        )
        .fetch_all(self.pool.inner())
        .await?;

        Ok(AttributeStatistics {
            total,
            by_type,
            required,
            filterable,
            searchable,
            most_used: most_used
                .into_iter()
                .map(|(id, name, usage_count)| AttributeUsage {
                    attribute_id: AttributeId::from_uuid(id),
                    name,
                    usage_count,
                })
                .collect(),
        })
    }
}
