//! Operational control over the catalog cache.

use crate::cache::CacheCoordinator;
use crate::category_service::CategoryService;
use crate::dto::{CacheClearResponse, CacheHealthResponse, CacheStatsResponse, CacheWarmResponse};
use crate::product_service::ProductService;
use async_trait::async_trait;
use catalog_core::{CatalogResult, CategoryId, ProductId};
use catalog_repository::{CategoryRepository, ProductRepository};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait CacheAdminService: Send + Sync {
    /// Pings the cache backend.
    async fn health(&self) -> CacheHealthResponse;

    /// Key counts per namespace plus hit/miss counters.
    async fn stats(&self) -> CacheStatsResponse;

    /// Preloads the category tree and the featured products.
    async fn warm(&self) -> CacheWarmResponse;

    /// Drops the category under its id and its current slug.
    async fn invalidate_category(&self, id: CategoryId) -> CatalogResult<()>;

    /// Drops the product under its id, its current SKU and `sku` when given.
    async fn invalidate_product(&self, id: ProductId, sku: Option<String>) -> CatalogResult<()>;

    async fn invalidate_search(&self) -> CatalogResult<()>;

    /// Drops every catalog entry.
    async fn clear_all(&self) -> CatalogResult<CacheClearResponse>;
}

pub struct CacheAdminServiceImpl {
    cache: Arc<CacheCoordinator>,
    category_service: Arc<dyn CategoryService>,
    product_service: Arc<dyn ProductService>,
    categories: Arc<dyn CategoryRepository>,
    products: Arc<dyn ProductRepository>,
}

impl CacheAdminServiceImpl {
    pub fn new(
        cache: Arc<CacheCoordinator>,
        category_service: Arc<dyn CategoryService>,
        product_service: Arc<dyn ProductService>,
        categories: Arc<dyn CategoryRepository>,
        products: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            cache,
            category_service,
            product_service,
            categories,
            products,
        }
    }

    fn record<T>(response: &mut CacheWarmResponse, name: &str, result: CatalogResult<T>) {
        match result {
            Ok(_) => response.warmed.push(name.to_string()),
            Err(e) => {
                warn!("Cache warm-up of {} failed: {}", name, e);
                response.failed.push(name.to_string());
            }
        }
    }
}

#[async_trait]
impl CacheAdminService for CacheAdminServiceImpl {
    async fn health(&self) -> CacheHealthResponse {
        self.cache.health().await
    }

    async fn stats(&self) -> CacheStatsResponse {
        self.cache.stats().await
    }

    async fn warm(&self) -> CacheWarmResponse {
        let started = Instant::now();
        let mut response = CacheWarmResponse::default();

        if !self.cache.is_enabled() {
            return response;
        }

        Self::record(&mut response, "category_tree", self.category_service.tree().await);
        Self::record(&mut response, "featured_products", self.product_service.featured(None).await);

        response.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            "Cache warmed: {} loaded, {} failed in {}ms",
            response.warmed.len(),
            response.failed.len(),
            response.duration_ms
        );
        response
    }

    async fn invalidate_category(&self, id: CategoryId) -> CatalogResult<()> {
        info!("Invalidating cached category {}", id);
        let slug = self.categories.find_by_id(id).await?.map(|c| c.slug);
        let slugs: Vec<&str> = slug.iter().map(|s| s.as_str()).collect();
        self.cache.invalidate_category(id, &slugs).await;
        Ok(())
    }

    async fn invalidate_product(&self, id: ProductId, sku: Option<String>) -> CatalogResult<()> {
        info!("Invalidating cached product {}", id);
        let current = self.products.find_by_id(id).await?.map(|p| p.sku);
        let skus: Vec<&str> = sku
            .as_deref()
            .into_iter()
            .chain(current.iter().map(|s| s.as_str()))
            .collect();
        self.cache.invalidate_product(id, &skus).await;
        Ok(())
    }

    async fn invalidate_search(&self) -> CatalogResult<()> {
        info!("Invalidating cached search results");
        self.cache.invalidate_search().await;
        Ok(())
    }

    async fn clear_all(&self) -> CatalogResult<CacheClearResponse> {
        let keys_deleted = self.cache.clear_all().await;
        info!("Cache cleared, {} keys deleted", keys_deleted);
        Ok(CacheClearResponse { keys_deleted })
    }
}

impl std::fmt::Debug for CacheAdminServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAdminServiceImpl").finish_non_exhaustive()
    }
}
