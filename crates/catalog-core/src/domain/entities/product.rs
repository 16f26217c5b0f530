//! Product entity.

use crate::domain::value_objects::{Money, ProductImages, ProductStatus, SeoData, Sku, Slug};
use crate::{AttributeId, CatalogError, CatalogResult, CategoryId, ProductId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value of one attribute on one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProductAttributeValue {
    pub attribute_id: AttributeId,
    pub attribute_name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub sku: Sku,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Money,
    pub category_id: CategoryId,
    pub status: ProductStatus,
    pub images: ProductImages,
    pub seo: SeoData,
    pub is_featured: bool,
    pub sort_order: i32,
    pub attributes: Vec<ProductAttributeValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an active product.
    pub fn new(
        name: impl Into<String>,
        slug: Slug,
        sku: Sku,
        price: Money,
        category_id: CategoryId,
    ) -> CatalogResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogError::validation("Product name cannot be empty"));
        }
        let now = Utc::now();
        Ok(Self {
            id: ProductId::new(),
            name,
            slug,
            sku,
            description: None,
            short_description: None,
            price,
            category_id,
            status: ProductStatus::default(),
            images: ProductImages::default(),
            seo: SeoData::default(),
            is_featured: false,
            sort_order: 0,
            attributes: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns whether the status actually changed.
    pub fn change_status(&mut self, status: ProductStatus) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.touch();
        true
    }

    pub fn activate(&mut self) -> bool {
        self.change_status(ProductStatus::Active)
    }

    pub fn deactivate(&mut self) -> bool {
        self.change_status(ProductStatus::Inactive)
    }

    pub fn archive(&mut self) -> bool {
        self.change_status(ProductStatus::Archived)
    }

    pub fn add_image(&mut self, url: impl Into<String>, is_main: bool) {
        self.images.add_image(url, is_main);
        self.touch();
    }

    pub fn remove_image(&mut self, url: &str) -> bool {
        let removed = self.images.remove_image(url);
        if removed {
            self.touch();
        }
        removed
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Value of the named attribute, if set.
    #[must_use]
    pub fn attribute(&self, attribute_id: AttributeId) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|a| a.attribute_id == attribute_id)
            .map(|a| &a.value)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
