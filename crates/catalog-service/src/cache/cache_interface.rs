//! Cache interface trait for abstracted caching operations.

use async_trait::async_trait;
use catalog_core::CatalogResult;
use std::time::Duration;

/// Cache interface for storing and retrieving cached data.
///
/// Values are stored as JSON strings so the trait stays dyn-compatible;
/// [`CacheCoordinator`](super::CacheCoordinator) does the typed decoding.
#[async_trait]
pub trait CacheInterface: Send + Sync {
    /// Get a raw JSON value from the cache.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_raw(&self, key: &str) -> CatalogResult<Option<String>>;

    /// Set a raw JSON value in the cache with a TTL.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CatalogResult<()>;

    /// Delete a value from the cache.
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete(&self, key: &str) -> CatalogResult<bool>;

    /// Delete several keys in one round trip; returns how many existed.
    async fn delete_many(&self, keys: &[String]) -> CatalogResult<u64>;

    /// Check if a key exists in the cache.
    async fn exists(&self, key: &str) -> CatalogResult<bool>;

    /// Delete every key matching a glob pattern.
    ///
    /// Returns the number of keys deleted.
    async fn delete_pattern(&self, pattern: &str) -> CatalogResult<u64>;

    /// Count keys matching a glob pattern.
    async fn count_pattern(&self, pattern: &str) -> CatalogResult<u64>;

    /// Atomically increment an integer counter, returning the new value.
    async fn incr(&self, key: &str) -> CatalogResult<u64>;

    /// Read an integer counter; a missing key reads as zero.
    async fn get_counter(&self, key: &str) -> CatalogResult<u64>;

    /// Round trip to the backend.
    async fn ping(&self) -> CatalogResult<()>;

    /// Check if caching is enabled.
    fn is_enabled(&self) -> bool;
}
