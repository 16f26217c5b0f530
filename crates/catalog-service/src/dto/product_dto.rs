//! Product DTOs.

use catalog_core::domain::{Money, Product, ProductAttributeValue, ProductImages, ProductStatus, SeoData};
use catalog_core::validation::rules::{not_blank, valid_currency, valid_sku, valid_slug};
use catalog_core::{AttributeId, CatalogError, CatalogResult, CategoryId, ProductId};
use catalog_repository::{CategoryProductCount, ProductFilter, ProductSearchCriteria, ProductStatistics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Default number of featured products.
pub const DEFAULT_FEATURED_LIMIT: u32 = 10;

/// Largest batch accepted by the bulk endpoint.
pub const MAX_BULK_SIZE: usize = 100;

/// Value for one attribute on a create/update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttributeValueInput {
    pub attribute_id: AttributeId,
    pub value: Value,
}

/// Request to create a product.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,

    /// Derived from the name when omitted.
    #[validate(custom(function = "valid_slug"))]
    pub slug: Option<String>,

    #[validate(custom(function = "valid_sku"))]
    pub sku: String,

    #[validate(length(max = 10000))]
    pub description: Option<String>,

    #[validate(length(max = 500, message = "Short description cannot exceed 500 characters"))]
    pub short_description: Option<String>,

    /// Price in minor units (kopecks, cents).
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_minor: i64,

    /// Defaults to `RUB`.
    #[validate(custom(function = "valid_currency"))]
    pub currency: Option<String>,

    pub category_id: CategoryId,

    pub status: Option<ProductStatus>,

    #[validate(length(max = 2048))]
    pub main_image: Option<String>,

    #[serde(default)]
    pub gallery: Vec<String>,

    #[validate(length(max = 255, message = "Meta title cannot exceed 255 characters"))]
    pub meta_title: Option<String>,

    #[validate(length(max = 500, message = "Meta description cannot exceed 500 characters"))]
    pub meta_description: Option<String>,

    #[validate(length(max = 500))]
    pub meta_keywords: Option<String>,

    #[serde(default)]
    pub is_featured: bool,

    #[serde(default)]
    pub sort_order: i32,

    #[serde(default)]
    pub attributes: Vec<AttributeValueInput>,
}

impl CreateProductRequest {
    /// Price as a money value in the requested or default currency.
    pub fn price(&self) -> CatalogResult<Money> {
        let price = match &self.currency {
            Some(currency) => Money::new(self.price_minor, currency.as_str()),
            None => Money::rub(self.price_minor),
        };
        price.map_err(|e| CatalogError::validation(format!("price: {e}")))
    }

    #[must_use]
    pub fn seo(&self) -> SeoData {
        SeoData {
            title: self.meta_title.clone(),
            description: self.meta_description.clone(),
            keywords: self.meta_keywords.clone(),
        }
    }

    #[must_use]
    pub fn images(&self) -> ProductImages {
        let mut images = ProductImages::default();
        if let Some(main) = &self.main_image {
            images.add_image(main.clone(), true);
        }
        for url in &self.gallery {
            images.add_image(url.clone(), false);
        }
        images
    }
}

/// Partial update; omitted fields keep their value.
///
/// Attribute values are replaced through the dedicated attributes endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    #[validate(custom(function = "valid_slug"))]
    pub slug: Option<String>,

    #[validate(custom(function = "valid_sku"))]
    pub sku: Option<String>,

    #[validate(length(max = 10000))]
    pub description: Option<String>,

    #[validate(length(max = 500, message = "Short description cannot exceed 500 characters"))]
    pub short_description: Option<String>,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_minor: Option<i64>,

    #[validate(custom(function = "valid_currency"))]
    pub currency: Option<String>,

    pub category_id: Option<CategoryId>,

    pub status: Option<ProductStatus>,

    #[validate(length(max = 2048))]
    pub main_image: Option<String>,

    /// Replaces the gallery when present.
    pub gallery: Option<Vec<String>>,

    #[validate(length(max = 255, message = "Meta title cannot exceed 255 characters"))]
    pub meta_title: Option<String>,

    #[validate(length(max = 500, message = "Meta description cannot exceed 500 characters"))]
    pub meta_description: Option<String>,

    #[validate(length(max = 500))]
    pub meta_keywords: Option<String>,

    pub is_featured: Option<bool>,

    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    pub status: ProductStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SetAttributesRequest {
    pub attributes: Vec<AttributeValueInput>,
}

/// Operation applied by the bulk endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BulkOperation {
    Activate,
    Deactivate,
    Archive,
    Delete,
}

impl BulkOperation {
    /// Target status, `None` for deletion.
    #[must_use]
    pub const fn target_status(self) -> Option<ProductStatus> {
        match self {
            Self::Activate => Some(ProductStatus::Active),
            Self::Deactivate => Some(ProductStatus::Inactive),
            Self::Archive => Some(ProductStatus::Archived),
            Self::Delete => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkProductRequest {
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 products per request"))]
    pub product_ids: Vec<ProductId>,
    pub operation: BulkOperation,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkOperationResult {
    pub operation: BulkOperation,
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Ids that did not exist.
    pub failed_ids: Vec<ProductId>,
}

/// Filters of the product listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatus>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Case-insensitive match over name, description and SKU.
    pub search: Option<String>,
    pub sku: Option<String>,
    pub is_featured: Option<bool>,
}

impl From<ProductListQuery> for ProductFilter {
    fn from(query: ProductListQuery) -> Self {
        Self {
            category_id: query.category_id,
            status: query.status,
            min_price: query.min_price,
            max_price: query.max_price,
            search: query.search.filter(|s| !s.trim().is_empty()),
            sku: query.sku.filter(|s| !s.trim().is_empty()),
            is_featured: query.is_featured,
        }
    }
}

/// Search parameters; list values are comma separated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductSearchQuery {
    /// Free text over name, description and SKU.
    pub q: Option<String>,
    /// Category ids; each expands to its whole subtree.
    pub category_ids: Option<String>,
    /// Statuses such as `active,inactive`.
    pub statuses: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub is_featured: Option<bool>,
}

impl TryFrom<ProductSearchQuery> for ProductSearchCriteria {
    type Error = CatalogError;

    fn try_from(query: ProductSearchQuery) -> Result<Self, Self::Error> {
        let category_ids = split_list(query.category_ids.as_deref())
            .map(|s| CategoryId::parse(s).map_err(|_| CatalogError::validation(format!("Invalid category id '{s}'"))))
            .collect::<CatalogResult<Vec<_>>>()?;
        let statuses = split_list(query.statuses.as_deref())
            .map(|s| s.parse::<ProductStatus>().map_err(|e| CatalogError::validation(e.to_string())))
            .collect::<CatalogResult<Vec<_>>>()?;

        Ok(Self {
            query: query.q.filter(|q| !q.trim().is_empty()),
            category_ids,
            statuses,
            min_price: query.min_price,
            max_price: query.max_price,
            is_featured: query.is_featured,
        })
    }
}

fn split_list(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeaturedQuery {
    /// Defaults to 10, capped at 100.
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ByCategoryQuery {
    #[serde(default)]
    pub include_subcategories: bool,
}

/// Product response DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Money,
    /// Human readable price, e.g. `12.34 RUB`.
    pub price_display: String,
    pub category_id: CategoryId,
    pub status: ProductStatus,
    pub main_image: Option<String>,
    pub gallery: Vec<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub is_featured: bool,
    pub sort_order: i32,
    pub attributes: Vec<ProductAttributeValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.to_string(),
            sku: product.sku.to_string(),
            description: product.description.clone(),
            short_description: product.short_description.clone(),
            price_display: product.price.to_string(),
            price: product.price.clone(),
            category_id: product.category_id,
            status: product.status,
            main_image: product.images.main_image.clone(),
            gallery: product.images.gallery.clone(),
            meta_title: product.seo.title.clone(),
            meta_description: product.seo.description.clone(),
            meta_keywords: product.seo.keywords.clone(),
            is_featured: product.is_featured,
            sort_order: product.sort_order,
            attributes: product.attributes.clone(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self::from(&product)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryCountResponse {
    pub category_id: CategoryId,
    pub category_name: String,
    pub product_count: i64,
}

impl From<CategoryProductCount> for CategoryCountResponse {
    fn from(count: CategoryProductCount) -> Self {
        Self {
            category_id: count.category_id,
            category_name: count.category_name,
            product_count: count.product_count,
        }
    }
}

/// Product statistics; prices in minor units.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductStatsResponse {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub archived: i64,
    pub featured: i64,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub average_price: Option<i64>,
    pub top_categories: Vec<CategoryCountResponse>,
}

impl From<ProductStatistics> for ProductStatsResponse {
    fn from(stats: ProductStatistics) -> Self {
        Self {
            total: stats.total,
            active: stats.active,
            inactive: stats.inactive,
            archived: stats.archived,
            featured: stats.featured,
            min_price: stats.min_price,
            max_price: stats.max_price,
            average_price: stats.average_price,
            top_categories: stats.by_category.into_iter().map(Into::into).collect(),
        }
    }
}
