//! Cache-aside reads and post-commit invalidation for the catalog.
//!
//! Entity entries (`cat:{id}`, `slug:{slug}`, `prod:{id}`, `sku:{sku}`,
//! `attr:{id}`) are deleted explicitly. Collection entries are keyed by a
//! per-namespace generation; invalidating a namespace increments its
//! generation so readers never consult entries written under an older one.
//! A reader that loaded data before a write committed stores it under the
//! old generation, which is already unreachable once the write bumps it.
//!
//! Invalidation runs after the database write succeeds. Cache failures are
//! logged and never surface to callers.

use super::cache_keys::{self, CacheNamespace};
use super::CacheInterface;
use crate::dto::{CacheHealthResponse, CacheHealthStatus, CacheStatsResponse, NamespaceStats};
use catalog_config::CacheConfig;
use catalog_core::domain::{Category, Product};
use catalog_core::{AttributeId, CatalogResult, CategoryId, ProductId};
use metrics::{counter, describe_counter};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Metric names for the cache layer.
pub mod names {
    pub const CACHE_HITS_TOTAL: &str = "catalog_cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "catalog_cache_misses_total";
    pub const CACHE_INVALIDATIONS_TOTAL: &str = "catalog_cache_invalidations_total";
    pub const CACHE_ERRORS_TOTAL: &str = "catalog_cache_errors_total";
}

/// Register the cache metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Cache lookups served from Redis");
    describe_counter!(names::CACHE_MISSES_TOTAL, "Cache lookups that fell through to the database");
    describe_counter!(
        names::CACHE_INVALIDATIONS_TOTAL,
        "Namespace generation bumps and explicit key deletions"
    );
    describe_counter!(names::CACHE_ERRORS_TOTAL, "Cache operations that failed and were ignored");
}

/// TTL per cached data family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub categories: Duration,
    pub category_tree: Duration,
    pub product_details: Duration,
    pub search_results: Duration,
    pub category_attributes: Duration,
    pub product_lists: Duration,
    pub statistics: Duration,
}

impl From<&CacheConfig> for CacheTtls {
    fn from(config: &CacheConfig) -> Self {
        Self {
            categories: Duration::from_secs(config.ttl_categories),
            category_tree: Duration::from_secs(config.ttl_category_tree),
            product_details: Duration::from_secs(config.ttl_product_details),
            search_results: Duration::from_secs(config.ttl_search_results),
            category_attributes: Duration::from_secs(config.ttl_category_attributes),
            product_lists: Duration::from_secs(config.ttl_product_lists),
            statistics: Duration::from_secs(config.ttl_statistics),
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
    errors: AtomicU64,
}

/// What happened to an attribute definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeChange {
    Created,
    Updated,
    Deleted,
}

/// Owns cache-aside reads and every invalidation rule of the catalog.
pub struct CacheCoordinator {
    cache: Arc<dyn CacheInterface>,
    ttls: CacheTtls,
    counters: Counters,
}

impl CacheCoordinator {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheInterface>, config: &CacheConfig) -> Self {
        Self::with_ttls(cache, CacheTtls::from(config))
    }

    #[must_use]
    pub fn with_ttls(cache: Arc<dyn CacheInterface>, ttls: CacheTtls) -> Self {
        Self {
            cache,
            ttls,
            counters: Counters::default(),
        }
    }

    #[must_use]
    pub const fn ttls(&self) -> &CacheTtls {
        &self.ttls
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    // ============ Reads ============

    /// Current generation of a namespace; zero when it cannot be read.
    pub async fn generation(&self, namespace: CacheNamespace) -> u64 {
        match self.cache.get_counter(&cache_keys::generation(namespace)).await {
            Ok(gen) => gen,
            Err(e) => {
                self.record_error(namespace, "generation", &e);
                0
            }
        }
    }

    /// Cache-aside lookup.
    ///
    /// Serves `key` from the cache when present; otherwise runs `loader`
    /// and stores its result for `ttl`. Loader errors are returned and never
    /// cached. Cache errors and undecodable entries count as misses.
    pub async fn cached<T, F, Fut>(&self, namespace: CacheNamespace, key: &str, ttl: Duration, loader: F) -> CatalogResult<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = CatalogResult<T>> + Send,
    {
        if !self.cache.is_enabled() {
            return loader().await;
        }

        match self.cache.get_raw(key).await {
            Ok(Some(json)) => match serde_json::from_str::<T>(&json) {
                Ok(value) => {
                    self.record_hit(namespace);
                    return Ok(value);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                    let _ = self.cache.delete(key).await;
                }
            },
            Ok(None) => {}
            Err(e) => self.record_error(namespace, "get", &e),
        }
        self.record_miss(namespace);

        let value = loader().await?;

        match serde_json::to_string(&value) {
            Ok(json) => {
                if let Err(e) = self.cache.set_raw(key, &json, ttl).await {
                    self.record_error(namespace, "set", &e);
                }
            }
            Err(e) => warn!(key = %key, error = %e, "Failed to serialize value for caching"),
        }

        Ok(value)
    }

    // ============ Invalidation rules ============

    /// Category created, updated or deleted.
    ///
    /// `slugs` carries the old and new slug when they differ.
    pub async fn on_category_changed(&self, id: CategoryId, slugs: &[&str]) {
        let mut keys = vec![cache_keys::category_by_id(id)];
        keys.extend(slugs.iter().map(|slug| cache_keys::category_by_slug(slug)));
        self.delete_keys(CacheNamespace::Category, &keys).await;

        // Product lists by category embed the subtree.
        self.bump_all(&[CacheNamespace::Category, CacheNamespace::Product, CacheNamespace::Search])
            .await;
    }

    /// A subtree was re-parented: every moved node changed its path.
    pub async fn on_categories_moved(&self, moved: &[Category]) {
        let keys: Vec<String> = moved
            .iter()
            .flat_map(|c| [cache_keys::category_by_id(c.id), cache_keys::category_by_slug(c.slug.as_str())])
            .collect();
        self.delete_keys(CacheNamespace::Category, &keys).await;
        self.bump_all(&[CacheNamespace::Category, CacheNamespace::Product, CacheNamespace::Search])
            .await;
    }

    /// Product created, updated, deleted or status changed.
    ///
    /// `skus` carries the old and new SKU when they differ.
    pub async fn on_product_changed(&self, id: ProductId, skus: &[&str]) {
        let mut keys = vec![cache_keys::product_by_id(id)];
        keys.extend(skus.iter().map(|sku| cache_keys::product_by_sku(sku)));
        self.delete_keys(CacheNamespace::Product, &keys).await;
        self.bump_all(&[CacheNamespace::Product, CacheNamespace::Search]).await;
    }

    /// Bulk product operation: one bump for the whole batch.
    pub async fn on_products_changed(&self, products: &[Product]) {
        if products.is_empty() {
            return;
        }
        let keys: Vec<String> = products
            .iter()
            .flat_map(|p| [cache_keys::product_by_id(p.id), cache_keys::product_by_sku(p.sku.as_str())])
            .collect();
        self.delete_keys(CacheNamespace::Product, &keys).await;
        self.bump_all(&[CacheNamespace::Product, CacheNamespace::Search]).await;
    }

    pub async fn on_attribute_changed(&self, id: AttributeId, change: AttributeChange) {
        self.delete_keys(CacheNamespace::Attribute, &[cache_keys::attribute_by_id(id)])
            .await;
        self.bump(CacheNamespace::Category).await;

        if matches!(change, AttributeChange::Updated | AttributeChange::Deleted) {
            // Product payloads embed attribute names.
            self.delete_pattern(CacheNamespace::Product, &cache_keys::product_entities_pattern())
                .await;
            self.delete_pattern(CacheNamespace::Product, &cache_keys::product_sku_pattern())
                .await;
            self.bump_all(&[CacheNamespace::Product, CacheNamespace::Search]).await;
        }
    }

    /// Category attribute assignments changed; one bump per request.
    pub async fn on_category_attributes_changed(&self) {
        self.bump(CacheNamespace::Category).await;
    }

    // ============ Manual invalidation ============

    /// Evicts the category under its id, each of `slugs` and the slug of the
    /// cached entry if there is one.
    pub async fn invalidate_category(&self, id: CategoryId, slugs: &[&str]) {
        let cached = self.cached_entity::<Category>(&cache_keys::category_by_id(id)).await.map(|c| c.slug);
        let mut all = slugs.to_vec();
        all.extend(cached.iter().map(|s| s.as_str()).filter(|s| !slugs.contains(s)));
        self.on_category_changed(id, &all).await;
    }

    /// Evicts the product under its id, each of `skus` and the SKU of the
    /// cached entry if there is one.
    pub async fn invalidate_product(&self, id: ProductId, skus: &[&str]) {
        let cached = self.cached_entity::<Product>(&cache_keys::product_by_id(id)).await.map(|p| p.sku);
        let mut all = skus.to_vec();
        all.extend(cached.iter().map(|s| s.as_str()).filter(|s| !skus.contains(s)));
        self.on_product_changed(id, &all).await;
    }

    pub async fn invalidate_search(&self) {
        self.bump(CacheNamespace::Search).await;
    }

    /// Deletes every catalog entry except the generation counters, then
    /// bumps every namespace. Returns the number of keys deleted.
    pub async fn clear_all(&self) -> u64 {
        // The segment after the namespace never starts with `g` except `gen`.
        let pattern = format!("{}:*:[^g]*", cache_keys::CACHE_PREFIX);
        let deleted = match self.cache.delete_pattern(&pattern).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to clear cache");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                0
            }
        };
        self.bump_all(&CacheNamespace::all()).await;
        debug!(deleted, "Cache cleared");
        deleted
    }

    // ============ Statistics and health ============

    pub async fn stats(&self) -> CacheStatsResponse {
        let mut namespaces = Vec::with_capacity(CacheNamespace::all().len());
        for namespace in CacheNamespace::all() {
            let keys = match self.cache.count_pattern(&cache_keys::namespace_pattern(namespace)).await {
                Ok(count) => count,
                Err(e) => {
                    self.record_error(namespace, "count", &e);
                    0
                }
            };
            namespaces.push(NamespaceStats {
                namespace: namespace.as_str().to_string(),
                keys,
                generation: self.generation(namespace).await,
            });
        }

        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if lookups == 0 { 0.0 } else { hits as f64 / lookups as f64 };

        CacheStatsResponse {
            enabled: self.cache.is_enabled(),
            total_keys: namespaces.iter().map(|n| n.keys).sum(),
            namespaces,
            hits,
            misses,
            hit_rate,
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }

    pub async fn health(&self) -> CacheHealthResponse {
        if !self.cache.is_enabled() {
            return CacheHealthResponse {
                status: CacheHealthStatus::Disabled,
                latency_ms: None,
                message: Some("Redis cache is disabled".to_string()),
            };
        }

        let started = Instant::now();
        match self.cache.ping().await {
            Ok(()) => CacheHealthResponse {
                status: CacheHealthStatus::Healthy,
                latency_ms: Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)),
                message: None,
            },
            Err(e) => CacheHealthResponse {
                status: CacheHealthStatus::Unhealthy,
                latency_ms: None,
                message: Some(e.to_string()),
            },
        }
    }

    // ============ Internals ============

    async fn cached_entity<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get_raw(key).await {
            Ok(Some(json)) => serde_json::from_str(&json).ok(),
            _ => None,
        }
    }

    async fn bump(&self, namespace: CacheNamespace) {
        if !self.cache.is_enabled() {
            return;
        }
        match self.cache.incr(&cache_keys::generation(namespace)).await {
            Ok(gen) => {
                debug!(namespace = %namespace, generation = gen, "Cache generation bumped");
                self.record_invalidation(namespace);
            }
            Err(e) => self.record_error(namespace, "bump", &e),
        }
    }

    async fn bump_all(&self, namespaces: &[CacheNamespace]) {
        for namespace in namespaces {
            self.bump(*namespace).await;
        }
    }

    async fn delete_keys(&self, namespace: CacheNamespace, keys: &[String]) {
        if !self.cache.is_enabled() || keys.is_empty() {
            return;
        }
        match self.cache.delete_many(keys).await {
            Ok(deleted) => {
                debug!(namespace = %namespace, requested = keys.len(), deleted, "Cache keys deleted");
                self.record_invalidation(namespace);
            }
            Err(e) => self.record_error(namespace, "delete", &e),
        }
    }

    async fn delete_pattern(&self, namespace: CacheNamespace, pattern: &str) {
        if !self.cache.is_enabled() {
            return;
        }
        match self.cache.delete_pattern(pattern).await {
            Ok(deleted) => {
                debug!(namespace = %namespace, pattern = %pattern, deleted, "Cache pattern deleted");
                self.record_invalidation(namespace);
            }
            Err(e) => self.record_error(namespace, "delete_pattern", &e),
        }
    }

    fn record_hit(&self, namespace: CacheNamespace) {
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        counter!(names::CACHE_HITS_TOTAL, "namespace" => namespace.as_str()).increment(1);
    }

    fn record_miss(&self, namespace: CacheNamespace) {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        counter!(names::CACHE_MISSES_TOTAL, "namespace" => namespace.as_str()).increment(1);
    }

    fn record_invalidation(&self, namespace: CacheNamespace) {
        self.counters.invalidations.fetch_add(1, Ordering::Relaxed);
        counter!(names::CACHE_INVALIDATIONS_TOTAL, "namespace" => namespace.as_str()).increment(1);
    }

    fn record_error(&self, namespace: CacheNamespace, operation: &'static str, error: &dyn std::fmt::Display) {
        warn!(namespace = %namespace, operation, error = %error, "Cache operation failed");
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
        counter!(names::CACHE_ERRORS_TOTAL, "namespace" => namespace.as_str(), "operation" => operation)
            .increment(1);
    }
}
