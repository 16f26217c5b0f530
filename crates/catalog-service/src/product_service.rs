//! Product service.

use crate::cache::{cache_keys, CacheCoordinator, CacheNamespace};
use crate::dto::{
    AttributeValueInput, BulkOperationResult, BulkProductRequest, CreateProductRequest,
    ProductListQuery, ProductResponse, ProductSearchQuery, ProductStatsResponse, SetAttributesRequest,
    UpdateProductRequest, DEFAULT_FEATURED_LIMIT,
};
use crate::support::resolve_slug;
use async_trait::async_trait;
use catalog_core::domain::{Money, Product, ProductAttributeValue, ProductStatus, SeoData, Sku};
use catalog_core::{
    AttributeId, CatalogError, CatalogResult, CategoryId, Page, PageRequest, ProductId, ProductSortField, Sort,
    ValidateExt,
};
use catalog_repository::{
    AttributeRepository, CategoryRepository, ProductFilter, ProductRepository, ProductSearchCriteria,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_FEATURED_LIMIT: u32 = 100;

/// Product use cases.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait ProductService: Send + Sync {
    async fn create(&self, request: CreateProductRequest) -> CatalogResult<ProductResponse>;

    async fn get(&self, id: ProductId) -> CatalogResult<ProductResponse>;

    async fn get_by_sku(&self, sku: &str) -> CatalogResult<ProductResponse>;

    async fn list(
        &self,
        query: ProductListQuery,
        page: PageRequest,
        sort: Sort<ProductSortField>,
    ) -> CatalogResult<Page<ProductResponse>>;

    async fn search(
        &self,
        query: ProductSearchQuery,
        page: PageRequest,
        sort: Sort<ProductSortField>,
    ) -> CatalogResult<Page<ProductResponse>>;

    async fn by_category(&self, category_id: CategoryId, include_subcategories: bool)
        -> CatalogResult<Vec<ProductResponse>>;

    async fn featured(&self, limit: Option<u32>) -> CatalogResult<Vec<ProductResponse>>;

    async fn update(&self, id: ProductId, request: UpdateProductRequest) -> CatalogResult<ProductResponse>;

    async fn change_status(&self, id: ProductId, status: ProductStatus) -> CatalogResult<ProductResponse>;

    async fn delete(&self, id: ProductId) -> CatalogResult<()>;

    async fn bulk(&self, request: BulkProductRequest) -> CatalogResult<BulkOperationResult>;

    async fn stats(&self) -> CatalogResult<ProductStatsResponse>;

    /// Replaces every attribute value of a product.
    async fn set_attributes(&self, id: ProductId, request: SetAttributesRequest) -> CatalogResult<ProductResponse>;
}

pub struct ProductServiceImpl {
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
    attributes: Arc<dyn AttributeRepository>,
    cache: Arc<CacheCoordinator>,
}

impl ProductServiceImpl {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        categories: Arc<dyn CategoryRepository>,
        attributes: Arc<dyn AttributeRepository>,
        cache: Arc<CacheCoordinator>,
    ) -> Self {
        Self {
            products,
            categories,
            attributes,
            cache,
        }
    }

    async fn find(&self, id: ProductId) -> CatalogResult<Product> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Product", id))
    }

    async fn ensure_category(&self, id: CategoryId) -> CatalogResult<()> {
        if self.categories.find_by_id(id).await?.is_none() {
            return Err(CatalogError::not_found("Category", id));
        }
        Ok(())
    }

    async fn ensure_sku_available(&self, sku: &str, exclude: Option<ProductId>) -> CatalogResult<()> {
        if self.products.exists_by_sku(sku, exclude).await? {
            return Err(CatalogError::conflict(format!("Product with SKU '{sku}' already exists")));
        }
        Ok(())
    }

    async fn ensure_slug_available(&self, slug: &str, exclude: Option<ProductId>) -> CatalogResult<()> {
        if self.products.exists_by_slug(slug, exclude).await? {
            return Err(CatalogError::conflict(format!("Product with slug '{slug}' already exists")));
        }
        Ok(())
    }

    /// Validates each value against its attribute definition and returns the
    /// normalized values.
    async fn resolve_values(&self, inputs: &[AttributeValueInput]) -> CatalogResult<Vec<ProductAttributeValue>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::with_capacity(inputs.len());
        if let Some(dup) = inputs.iter().find(|input| !seen.insert(input.attribute_id)) {
            return Err(CatalogError::validation(format!(
                "Attribute {} is given more than once",
                dup.attribute_id
            )));
        }

        let ids: Vec<AttributeId> = inputs.iter().map(|input| input.attribute_id).collect();
        let definitions = self.attributes.find_by_ids(&ids).await?;

        let mut values = Vec::with_capacity(inputs.len());
        let mut errors = Vec::new();
        for input in inputs {
            let Some(attribute) = definitions.iter().find(|a| a.id == input.attribute_id) else {
                return Err(CatalogError::not_found("Attribute", input.attribute_id));
            };
            let result = attribute.validate_value(&input.value);
            if !result.is_valid {
                errors.push(format!("{}: {}", attribute.name, result.errors.join(", ")));
                continue;
            }
            values.push(ProductAttributeValue {
                attribute_id: attribute.id,
                attribute_name: attribute.name.clone(),
                value: result.normalized_value.unwrap_or_else(|| input.value.clone()),
            });
        }

        if !errors.is_empty() {
            return Err(CatalogError::validation(errors.join("; ")));
        }
        Ok(values)
    }

    /// Adds defaults for required attributes of the category that were not
    /// supplied; fails when a required attribute has no default.
    async fn apply_required(&self, category_id: CategoryId, values: &mut Vec<ProductAttributeValue>) -> CatalogResult<()> {
        let assigned = self.attributes.find_for_category(category_id).await?;
        let mut missing = Vec::new();
        for entry in assigned.into_iter().filter(|a| a.attribute.is_required) {
            let attribute = entry.attribute;
            if values.iter().any(|v| v.attribute_id == attribute.id) {
                continue;
            }
            match attribute.default_value.clone() {
                Some(default) => values.push(ProductAttributeValue {
                    attribute_id: attribute.id,
                    attribute_name: attribute.name,
                    value: default,
                }),
                None => missing.push(attribute.name),
            }
        }
        if !missing.is_empty() {
            return Err(CatalogError::validation(format!(
                "Missing required attributes: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    async fn load_cached(&self, key: String, lookup: ProductLookup<'_>) -> CatalogResult<Product> {
        let products = &self.products;
        self.cache
            .cached(CacheNamespace::Product, &key, self.cache.ttls().product_details, || async move {
                let found = match lookup {
                    ProductLookup::Id(id) => products.find_by_id(id).await?,
                    ProductLookup::Sku(sku) => products.find_by_sku(sku).await?,
                };
                found.ok_or_else(|| match lookup {
                    ProductLookup::Id(id) => CatalogError::not_found("Product", id),
                    ProductLookup::Sku(sku) => CatalogError::not_found("Product", sku),
                })
            })
            .await
    }
}

#[derive(Clone, Copy)]
enum ProductLookup<'a> {
    Id(ProductId),
    Sku(&'a str),
}

fn check_price_range(min: Option<i64>, max: Option<i64>) -> CatalogResult<()> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(CatalogError::validation(format!(
            "min_price ({min}) cannot exceed max_price ({max})"
        ))),
        _ => Ok(()),
    }
}

fn responses(products: Vec<Product>) -> Vec<ProductResponse> {
    products.into_iter().map(ProductResponse::from).collect()
}

#[async_trait]
impl ProductService for ProductServiceImpl {
    async fn create(&self, request: CreateProductRequest) -> CatalogResult<ProductResponse> {
        debug!("Creating product: {}", request.sku);
        request.validate_request()?;

        let price = request.price()?;
        let sku = Sku::new(&request.sku).map_err(|e| CatalogError::validation(format!("sku: {e}")))?;
        self.ensure_sku_available(sku.as_str(), None).await?;
        let slug = resolve_slug(request.slug.as_deref(), &request.name)?;
        self.ensure_slug_available(slug.as_str(), None).await?;
        self.ensure_category(request.category_id).await?;

        let mut values = self.resolve_values(&request.attributes).await?;
        self.apply_required(request.category_id, &mut values).await?;

        let seo = request.seo();
        if let Some(violation) = seo.violation() {
            return Err(CatalogError::validation(violation));
        }
        let images = request.images();

        let mut product = Product::new(request.name, slug, sku, price, request.category_id)?;
        product.description = request.description;
        product.short_description = request.short_description;
        product.images = images;
        product.seo = seo;
        product.is_featured = request.is_featured;
        product.sort_order = request.sort_order;
        product.attributes = values;
        if let Some(status) = request.status {
            product.change_status(status);
        }

        let saved = self.products.save(&product).await?;
        self.cache.on_product_changed(saved.id, &[saved.sku.as_str()]).await;

        info!("Product created: {} ({})", saved.id, saved.sku);
        Ok(saved.into())
    }

    async fn get(&self, id: ProductId) -> CatalogResult<ProductResponse> {
        self.load_cached(cache_keys::product_by_id(id), ProductLookup::Id(id))
            .await
            .map(ProductResponse::from)
    }

    async fn get_by_sku(&self, sku: &str) -> CatalogResult<ProductResponse> {
        self.load_cached(cache_keys::product_by_sku(sku), ProductLookup::Sku(sku))
            .await
            .map(ProductResponse::from)
    }

    async fn list(
        &self,
        query: ProductListQuery,
        page: PageRequest,
        sort: Sort<ProductSortField>,
    ) -> CatalogResult<Page<ProductResponse>> {
        let filter = ProductFilter::from(query);
        check_price_range(filter.min_price, filter.max_price)?;

        let gen = self.cache.generation(CacheNamespace::Product).await;
        let hash = cache_keys::query_hash(&json!({ "filter": filter, "page": page, "sort": sort }))?;
        let products = &self.products;
        let filter = &filter;

        let page: Page<Product> = self
            .cache
            .cached(
                CacheNamespace::Product,
                &cache_keys::product_list(gen, &hash),
                self.cache.ttls().product_lists,
                || async move { products.find_all(filter, page, sort).await },
            )
            .await?;
        Ok(page.map(ProductResponse::from))
    }

    async fn search(
        &self,
        query: ProductSearchQuery,
        page: PageRequest,
        sort: Sort<ProductSortField>,
    ) -> CatalogResult<Page<ProductResponse>> {
        let criteria = ProductSearchCriteria::try_from(query)?;
        check_price_range(criteria.min_price, criteria.max_price)?;

        let gen = self.cache.generation(CacheNamespace::Search).await;
        let hash = cache_keys::query_hash(&json!({ "criteria": criteria, "page": page, "sort": sort }))?;
        let products = &self.products;
        let criteria = &criteria;

        let page: Page<Product> = self
            .cache
            .cached(
                CacheNamespace::Search,
                &cache_keys::search_results(gen, &hash),
                self.cache.ttls().search_results,
                || async move { products.search(criteria, page, sort).await },
            )
            .await?;
        Ok(page.map(ProductResponse::from))
    }

    async fn by_category(
        &self,
        category_id: CategoryId,
        include_subcategories: bool,
    ) -> CatalogResult<Vec<ProductResponse>> {
        let gen = self.cache.generation(CacheNamespace::Product).await;

        let products: Vec<Product> = self
            .cache
            .cached(
                CacheNamespace::Product,
                &cache_keys::products_by_category(gen, category_id, include_subcategories),
                self.cache.ttls().product_lists,
                || async move {
                    self.ensure_category(category_id).await?;
                    self.products.find_by_category(category_id, include_subcategories).await
                },
            )
            .await?;
        Ok(responses(products))
    }

    async fn featured(&self, limit: Option<u32>) -> CatalogResult<Vec<ProductResponse>> {
        let limit = limit.unwrap_or(DEFAULT_FEATURED_LIMIT).clamp(1, MAX_FEATURED_LIMIT);
        let gen = self.cache.generation(CacheNamespace::Product).await;
        let products = &self.products;

        let featured: Vec<Product> = self
            .cache
            .cached(
                CacheNamespace::Product,
                &cache_keys::featured_products(gen, limit),
                self.cache.ttls().product_lists,
                || async move { products.find_featured(limit).await },
            )
            .await?;
        Ok(responses(featured))
    }

    async fn update(&self, id: ProductId, request: UpdateProductRequest) -> CatalogResult<ProductResponse> {
        debug!("Updating product: {}", id);
        request.validate_request()?;

        let mut product = self.find(id).await?;
        let old_sku = product.sku.clone();

        if let Some(sku) = request.sku.as_deref().filter(|sku| *sku != old_sku.as_str()) {
            let sku = Sku::new(sku).map_err(|e| CatalogError::validation(format!("sku: {e}")))?;
            self.ensure_sku_available(sku.as_str(), Some(id)).await?;
            product.sku = sku;
        }
        if let Some(slug) = request.slug.as_deref().filter(|slug| *slug != product.slug.as_str()) {
            let slug = resolve_slug(Some(slug), &product.name)?;
            self.ensure_slug_available(slug.as_str(), Some(id)).await?;
            product.slug = slug;
        }
        if let Some(category_id) = request.category_id.filter(|c| *c != product.category_id) {
            self.ensure_category(category_id).await?;
            product.category_id = category_id;
        }
        if let Some(name) = request.name {
            product.name = name;
        }
        if request.price_minor.is_some() || request.currency.is_some() {
            let amount = request.price_minor.unwrap_or(product.price.amount_minor);
            let currency = request.currency.unwrap_or_else(|| product.price.currency.clone());
            product.price = Money::new(amount, currency).map_err(|e| CatalogError::validation(format!("price: {e}")))?;
        }
        if let Some(description) = request.description {
            product.description = Some(description);
        }
        if let Some(short_description) = request.short_description {
            product.short_description = Some(short_description);
        }
        if let Some(main_image) = request.main_image {
            product.images.main_image = Some(main_image);
        }
        if let Some(gallery) = request.gallery {
            product.images.gallery = gallery;
        }
        if request.meta_title.is_some() || request.meta_description.is_some() || request.meta_keywords.is_some() {
            let seo = SeoData {
                title: request.meta_title.or_else(|| product.seo.title.clone()),
                description: request.meta_description.or_else(|| product.seo.description.clone()),
                keywords: request.meta_keywords.or_else(|| product.seo.keywords.clone()),
            };
            if let Some(violation) = seo.violation() {
                return Err(CatalogError::validation(violation));
            }
            product.seo = seo;
        }
        if let Some(is_featured) = request.is_featured {
            product.is_featured = is_featured;
        }
        if let Some(sort_order) = request.sort_order {
            product.sort_order = sort_order;
        }
        if let Some(status) = request.status {
            product.change_status(status);
        }
        product.touch();

        let updated = self.products.update(&product).await?;
        self.cache
            .on_product_changed(id, &[old_sku.as_str(), updated.sku.as_str()])
            .await;

        info!("Product updated: {}", id);
        Ok(updated.into())
    }

    async fn change_status(&self, id: ProductId, status: ProductStatus) -> CatalogResult<ProductResponse> {
        let mut product = self.find(id).await?;
        if !product.change_status(status) {
            debug!("Product {} already {}", id, status);
            return Ok(product.into());
        }

        let updated = self.products.update(&product).await?;
        self.cache.on_product_changed(id, &[updated.sku.as_str()]).await;

        info!("Product {} status changed to {}", id, status);
        Ok(updated.into())
    }

    async fn delete(&self, id: ProductId) -> CatalogResult<()> {
        let product = self.find(id).await?;
        if !self.products.delete(id).await? {
            return Err(CatalogError::not_found("Product", id));
        }
        self.cache.on_product_changed(id, &[product.sku.as_str()]).await;

        info!("Product deleted: {}", id);
        Ok(())
    }

    async fn bulk(&self, request: BulkProductRequest) -> CatalogResult<BulkOperationResult> {
        request.validate_request()?;

        let mut seen = HashSet::with_capacity(request.product_ids.len());
        let ids: Vec<ProductId> = request.product_ids.into_iter().filter(|id| seen.insert(*id)).collect();

        let existing = self.products.find_by_ids(&ids).await?;
        let found: HashSet<ProductId> = existing.iter().map(|p| p.id).collect();
        let failed_ids: Vec<ProductId> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
        let targets: Vec<ProductId> = ids.iter().copied().filter(|id| found.contains(id)).collect();

        let succeeded = if targets.is_empty() {
            0
        } else {
            match request.operation.target_status() {
                Some(status) => self.products.bulk_update_status(&targets, status).await?,
                None => self.products.bulk_delete(&targets).await?,
            }
        };
        self.cache.on_products_changed(&existing).await;

        if !failed_ids.is_empty() {
            warn!("Bulk {:?}: {} products not found", request.operation, failed_ids.len());
        }
        info!("Bulk {:?} applied to {} of {} products", request.operation, succeeded, ids.len());

        let succeeded = usize::try_from(succeeded).unwrap_or(usize::MAX);
        Ok(BulkOperationResult {
            operation: request.operation,
            requested: ids.len(),
            succeeded,
            failed: ids.len().saturating_sub(succeeded),
            failed_ids,
        })
    }

    async fn stats(&self) -> CatalogResult<ProductStatsResponse> {
        let gen = self.cache.generation(CacheNamespace::Product).await;
        let products = &self.products;

        self.cache
            .cached(
                CacheNamespace::Product,
                &cache_keys::product_stats(gen),
                self.cache.ttls().statistics,
                || async move { products.statistics().await },
            )
            .await
            .map(ProductStatsResponse::from)
    }

    async fn set_attributes(&self, id: ProductId, request: SetAttributesRequest) -> CatalogResult<ProductResponse> {
        let mut product = self.find(id).await?;
        let values = self.resolve_values(&request.attributes).await?;

        self.products.set_attribute_values(id, &values).await?;
        product.attributes = values;
        self.cache.on_product_changed(id, &[product.sku.as_str()]).await;

        info!("Product {} attributes replaced ({} values)", id, product.attributes.len());
        Ok(product.into())
    }
}

impl std::fmt::Debug for ProductServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductServiceImpl").finish_non_exhaustive()
    }
}
