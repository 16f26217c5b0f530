//! PostgreSQL product repository.

use super::{corrupt, limit_offset, optional_pattern, page_of};
use crate::traits::{CategoryProductCount, ProductFilter, ProductRepository, ProductSearchCriteria, ProductStatistics};
use crate::DatabasePool;
use async_trait::async_trait;
use catalog_core::domain::{Money, Product, ProductAttributeValue, ProductImages, ProductStatus, SeoData, Sku, Slug};
use catalog_core::{
    AttributeId, CatalogError, CatalogResult, CategoryId, Page, PageRequest, ProductId, ProductSortField, Sort,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const COLUMNS: &str = "id, name, slug, sku, description, short_description, price_minor, currency, \
     category_id, status, main_image, gallery, meta_title, meta_description, meta_keywords, \
     is_featured, sort_order, created_at, updated_at";

const FILTER_WHERE: &str = "WHERE ($1::uuid IS NULL OR category_id = $1) \
       AND ($2::text IS NULL OR status::text = $2) \
       AND ($3::bigint IS NULL OR price_minor >= $3) \
       AND ($4::bigint IS NULL OR price_minor <= $4) \
       AND ($5::text IS NULL OR name ILIKE $5 OR description ILIKE $5 OR sku ILIKE $5) \
       AND ($6::text IS NULL OR sku = $6) \
       AND ($7::boolean IS NULL OR is_featured = $7)";

const SEARCH_WHERE: &str = "WHERE ($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1 \
            OR short_description ILIKE $1 OR sku ILIKE $1) \
       AND (cardinality($2::uuid[]) = 0 OR category_id IN ( \
            SELECT d.id FROM categories c JOIN categories d ON d.path <@ c.path WHERE c.id = ANY($2))) \
       AND (cardinality($3::text[]) = 0 OR status::text = ANY($3)) \
       AND ($4::bigint IS NULL OR price_minor >= $4) \
       AND ($5::bigint IS NULL OR price_minor <= $5) \
       AND ($6::boolean IS NULL OR is_featured = $6)";

/// PostgreSQL product repository implementation.
#[derive(Clone)]
pub struct PgProductRepository {
    pool: Arc<DatabasePool>,
}

impl PgProductRepository {
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    /// Converts rows and attaches their attribute values in one extra query.
    async fn hydrate(&self, rows: Vec<ProductRow>) -> CatalogResult<Vec<Product>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let values = sqlx::query_as::<_, AttributeValueRow>(
            "SELECT pa.product_id, pa.attribute_id, a.name AS attribute_name, pa.value \
             FROM product_attributes pa \
             JOIN attributes a ON a.id = pa.attribute_id \
             WHERE pa.product_id = ANY($1) \
             ORDER BY a.sort_order, a.name",
        )
        .bind(&ids)
        .fetch_all(self.pool.inner())
        .await?;

        let mut by_product: HashMap<Uuid, Vec<ProductAttributeValue>> = HashMap::new();
        for value in values {
            by_product.entry(value.product_id).or_default().push(ProductAttributeValue {
                attribute_id: AttributeId::from_uuid(value.attribute_id),
                attribute_name: value.attribute_name,
                value: value.value,
            });
        }

        rows.into_iter()
            .map(|row| {
                let attributes = by_product.remove(&row.id).unwrap_or_default();
                let mut product = Product::try_from(row)?;
                product.attributes = attributes;
                Ok(product)
            })
            .collect()
    }

    async fn find_one(&self, column: &str, value: &str) -> CatalogResult<Option<Product>> {
        let sql = format!("SELECT {COLUMNS} FROM products WHERE {column} = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(self.hydrate(row.into_iter().collect()).await?.pop())
    }

    async fn exists(&self, column: &str, value: &str, exclude: Option<ProductId>) -> CatalogResult<bool> {
        let sql = format!("SELECT 1 FROM products WHERE {column} = $1 AND ($2::uuid IS NULL OR id <> $2) LIMIT 1");
        let found: Option<i32> = sqlx::query_scalar(&sql)
            .bind(value)
            .bind(exclude.map(ProductId::into_inner))
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(found.is_some())
    }
}

fn order_by(sort: Sort<ProductSortField>) -> String {
    format!("ORDER BY {} {}, id", sort.field.column(), sort.order.as_sql())
}

fn uuids(ids: &[ProductId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_inner()).collect()
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    slug: String,
    sku: String,
    description: Option<String>,
    short_description: Option<String>,
    price_minor: i64,
    currency: String,
    category_id: Uuid,
    status: ProductStatus,
    main_image: Option<String>,
    gallery: Vec<String>,
    meta_title: Option<String>,
    meta_description: Option<String>,
    meta_keywords: Option<String>,
    is_featured: bool,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct AttributeValueRow {
    product_id: Uuid,
    attribute_id: Uuid,
    attribute_name: String,
    value: Value,
}

#[derive(Debug, FromRow)]
struct StatisticsRow {
    total: i64,
    active: i64,
    inactive: i64,
    archived: i64,
    featured: i64,
    min_price: Option<i64>,
    max_price: Option<i64>,
    average_price: Option<i64>,
}

impl TryFrom<ProductRow> for Product {
    type Error = CatalogError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: ProductId::from_uuid(row.id),
            name: row.name,
            slug: Slug::new(&row.slug).map_err(|e| corrupt("slug", e))?,
            sku: Sku::new(&row.sku).map_err(|e| corrupt("sku", e))?,
            description: row.description,
            short_description: row.short_description,
            price: Money::new(row.price_minor, row.currency.trim()).map_err(|e| corrupt("price", e))?,
            category_id: CategoryId::from_uuid(row.category_id),
            status: row.status,
            images: ProductImages {
                main_image: row.main_image,
                gallery: row.gallery,
            },
            seo: SeoData {
                title: row.meta_title,
                description: row.meta_description,
                keywords: row.meta_keywords,
            },
            is_featured: row.is_featured,
            sort_order: row.sort_order,
            attributes: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, id: ProductId) -> CatalogResult<Option<Product>> {
        debug!(product_id = %id, "Finding product by id");
        let sql = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id.into_inner())
            .fetch_optional(self.pool.inner())
            .await?;
        Ok(self.hydrate(row.into_iter().collect()).await?.pop())
    }

    async fn find_by_sku(&self, sku: &str) -> CatalogResult<Option<Product>> {
        self.find_one("sku", sku).await
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> CatalogResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {COLUMNS} FROM products WHERE id = ANY($1) ORDER BY name");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(uuids(ids))
            .fetch_all(self.pool.inner())
            .await?;
        self.hydrate(rows).await
    }

    async fn exists_by_sku(&self, sku: &str, exclude: Option<ProductId>) -> CatalogResult<bool> {
        self.exists("sku", sku, exclude).await
    }

    async fn exists_by_slug(&self, slug: &str, exclude: Option<ProductId>) -> CatalogResult<bool> {
        self.exists("slug", slug, exclude).await
    }

    async fn find_all(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
        sort: Sort<ProductSortField>,
    ) -> CatalogResult<Page<Product>> {
        let pattern = optional_pattern(filter.search.as_deref());
        let status = filter.status.map(|s| s.as_str());
        let category_id = filter.category_id.map(CategoryId::into_inner);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products {FILTER_WHERE}"))
            .bind(category_id)
            .bind(status)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(&pattern)
            .bind(&filter.sku)
            .bind(filter.is_featured)
            .fetch_one(self.pool.inner())
            .await?;

        let (limit, offset) = limit_offset(page);
        let sql = format!("SELECT {COLUMNS} FROM products {FILTER_WHERE} {} LIMIT $8 OFFSET $9", order_by(sort));
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category_id)
            .bind(status)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(&pattern)
            .bind(&filter.sku)
            .bind(filter.is_featured)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(page_of(self.hydrate(rows).await?, page, total))
    }

    async fn search(
        &self,
        criteria: &ProductSearchCriteria,
        page: PageRequest,
        sort: Sort<ProductSortField>,
    ) -> CatalogResult<Page<Product>> {
        let pattern = optional_pattern(criteria.query.as_deref());
        let category_ids: Vec<Uuid> = criteria.category_ids.iter().map(|id| id.into_inner()).collect();
        let statuses: Vec<String> = criteria.statuses.iter().map(|s| s.as_str().to_string()).collect();

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products {SEARCH_WHERE}"))
            .bind(&pattern)
            .bind(&category_ids)
            .bind(&statuses)
            .bind(criteria.min_price)
            .bind(criteria.max_price)
            .bind(criteria.is_featured)
            .fetch_one(self.pool.inner())
            .await?;

        let (limit, offset) = limit_offset(page);
        let sql = format!("SELECT {COLUMNS} FROM products {SEARCH_WHERE} {} LIMIT $7 OFFSET $8", order_by(sort));
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&pattern)
            .bind(&category_ids)
            .bind(&statuses)
            .bind(criteria.min_price)
            .bind(criteria.max_price)
            .bind(criteria.is_featured)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.inner())
            .await?;

        Ok(page_of(self.hydrate(rows).await?, page, total))
    }

    async fn find_by_category(&self, id: CategoryId, include_descendants: bool) -> CatalogResult<Vec<Product>> {
        let scope = if include_descendants {
            "category_id IN (SELECT d.id FROM categories c JOIN categories d ON d.path <@ c.path WHERE c.id = $1)"
        } else {
            "category_id = $1"
        };
        let sql = format!("SELECT {COLUMNS} FROM products WHERE {scope} ORDER BY sort_order, name");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id.into_inner())
            .fetch_all(self.pool.inner())
            .await?;
        self.hydrate(rows).await
    }

    async fn find_featured(&self, limit: u32) -> CatalogResult<Vec<Product>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM products \
             WHERE is_featured AND status = 'active' \
             ORDER BY sort_order, name LIMIT $1"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(self.pool.inner())
            .await?;
        self.hydrate(rows).await
    }

    async fn save(&self, product: &Product) -> CatalogResult<Product> {
        debug!(product_id = %product.id, sku = %product.sku, "Saving product");
        let mut tx = self.pool.inner().begin().await?;

        sqlx::query(
            "INSERT INTO products (id, name, slug, sku, description, short_description, price_minor, \
                 currency, category_id, status, main_image, gallery, meta_title, meta_description, \
                 meta_keywords, is_featured, sort_order, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
        )
        .bind(product.id.into_inner())
        .bind(&product.name)
        .bind(product.slug.as_str())
        .bind(product.sku.as_str())
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(product.price.amount_minor)
        .bind(&product.price.currency)
        .bind(product.category_id.into_inner())
        .bind(product.status)
        .bind(&product.images.main_image)
        .bind(&product.images.gallery)
        .bind(&product.seo.title)
        .bind(&product.seo.description)
        .bind(&product.seo.keywords)
        .bind(product.is_featured)
        .bind(product.sort_order)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        for value in &product.attributes {
            sqlx::query("INSERT INTO product_attributes (product_id, attribute_id, value) VALUES ($1, $2, $3)")
                .bind(product.id.into_inner())
                .bind(value.attribute_id.into_inner())
                .bind(&value.value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(product.clone())
    }

    async fn update(&self, product: &Product) -> CatalogResult<Product> {
        debug!(product_id = %product.id, "Updating product");
        let updated_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            "UPDATE products SET name = $2, slug = $3, sku = $4, description = $5, short_description = $6, \
                 price_minor = $7, currency = $8, category_id = $9, status = $10, main_image = $11, \
                 gallery = $12, meta_title = $13, meta_description = $14, meta_keywords = $15, \
                 is_featured = $16, sort_order = $17 \
             WHERE id = $1 \
             RETURNING updated_at",
        )
        .bind(product.id.into_inner())
        .bind(&product.name)
        .bind(product.slug.as_str())
        .bind(product.sku.as_str())
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(product.price.amount_minor)
        .bind(&product.price.currency)
        .bind(product.category_id.into_inner())
        .bind(product.status)
        .bind(&product.images.main_image)
        .bind(&product.images.gallery)
        .bind(&product.seo.title)
        .bind(&product.seo.description)
        .bind(&product.seo.keywords)
        .bind(product.is_featured)
        .bind(product.sort_order)
        .fetch_optional(self.pool.inner())
        .await?;

        let updated_at = updated_at.ok_or_else(|| CatalogError::not_found("Product", product.id))?;
        let mut updated = product.clone();
        updated.updated_at = updated_at;
        Ok(updated)
    }

    async fn delete(&self, id: ProductId) -> CatalogResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn bulk_update_status(&self, ids: &[ProductId], status: ProductStatus) -> CatalogResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("UPDATE products SET status = $2 WHERE id = ANY($1)")
            .bind(uuids(ids))
            .bind(status)
            .execute(self.pool.inner())
            .await?;
        info!(requested = ids.len(), updated = result.rows_affected(), %status, "Bulk status update");
        Ok(result.rows_affected())
    }

    async fn bulk_delete(&self, ids: &[ProductId]) -> CatalogResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM products WHERE id = ANY($1)")
            .bind(uuids(ids))
            .execute(self.pool.inner())
            .await?;
        info!(requested = ids.len(), deleted = result.rows_affected(), "Bulk delete");
        Ok(result.rows_affected())
    }

    async fn statistics(&self) -> CatalogResult<ProductStatistics> {
        let totals = sqlx::query_as::<_, StatisticsRow>(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE status = 'active') AS active, \
                    COUNT(*) FILTER (WHERE status = 'inactive') AS inactive, \
                    COUNT(*) FILTER (WHERE status = 'archived') AS archived, \
                    COUNT(*) FILTER (WHERE is_featured) AS featured, \
                    MIN(price_minor) AS min_price, \
                    MAX(price_minor) AS max_price, \
                    ROUND(AVG(price_minor))::bigint AS average_price \
             FROM products",
        )
        .fetch_one(self.pool.inner())
        .await?;

        let by_category: Vec<(Uuid, String, i64)> = sqlx::query_as(
            "SELECT c.id, c.name, COUNT(p.id) AS product_count \
             FROM categories c \
             JOIN products p ON p.category_id = c.id \
             GROUP BY c.id, c.name \
             ORDER BY product_count DESC, c.name \
             LIMIT 10",
        )
        .fetch_all(self.pool.inner())
        .await?;

        Ok(ProductStatistics {
            total: totals.total,
            active: totals.active,
            inactive: totals.inactive,
            archived: totals.archived,
            featured: totals.featured,
            min_price: totals.min_price,
            max_price: totals.max_price,
            average_price: totals.average_price,
            by_category: by_category
                .into_iter()
                .map(|(id, name, count)| CategoryProductCount {
                    category_id: CategoryId::from_uuid(id),
                    category_name: name,
                    product_count: count,
                })
                .collect(),
        })
    }

    async fn set_attribute_values(&self, id: ProductId, values: &[ProductAttributeValue]) -> CatalogResult<()> {
        debug!(product_id = %id, count = values.len(), "Replacing product attribute values");
        let mut tx = self.pool.inner().begin().await?;

        sqlx::query("DELETE FROM product_attributes WHERE product_id = $1")
            .bind(id.into_inner())
            .execute(&mut *tx)
            .await?;

        for value in values {
            sqlx::query("INSERT INTO product_attributes (product_id, attribute_id, value) VALUES ($1, $2, $3)")
                .bind(id.into_inner())
                .bind(value.attribute_id.into_inner())
                .bind(&value.value)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE products SET updated_at = NOW() WHERE id = $1")
            .bind(id.into_inner())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
