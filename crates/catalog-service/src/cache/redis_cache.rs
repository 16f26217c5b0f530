//! Redis-based cache implementation.

use super::CacheInterface;
use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult};
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Connection, Pool};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Keys requested per SCAN round.
const SCAN_COUNT: usize = 500;

/// Keys per DEL command when deleting scanned keys.
const DELETE_BATCH: usize = 500;

/// Redis-based cache service.
///
/// A service built with [`RedisCacheService::disabled`] has no pool: reads
/// miss, writes and deletes are no-ops and counters read as zero.
#[derive(Clone)]
pub struct RedisCacheService {
    pool: Option<Arc<Pool>>,
}

impl RedisCacheService {
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool: Some(pool) }
    }

    /// Create a no-op cache service (for when Redis is disabled).
    #[must_use]
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    async fn get_conn(&self) -> CatalogResult<Connection> {
        match &self.pool {
            Some(pool) => pool
                .get()
                .await
                .map_err(|e| CatalogError::Cache(format!("Failed to get Redis connection: {e}"))),
            None => Err(CatalogError::Cache("Cache is disabled".to_string())),
        }
    }

    /// Collects every key matching `pattern` with cursor-based SCAN.
    async fn scan_keys(conn: &mut Connection, pattern: &str) -> CatalogResult<Vec<String>> {
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut *conn)
                .await
                .map_err(|e| CatalogError::Cache(format!("Failed to scan keys '{pattern}': {e}")))?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }
}

#[async_trait]
impl CacheInterface for RedisCacheService {
    fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_raw(&self, key: &str) -> CatalogResult<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| CatalogError::Cache(format!("Failed to get key '{key}': {e}")))?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CatalogResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| CatalogError::Cache(format!("Failed to set key '{key}': {e}")))?;

        debug!("Cached key '{}' with TTL {}s", key, ttl_secs);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CatalogResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| CatalogError::Cache(format!("Failed to delete key '{key}': {e}")))?;

        debug!("Deleted key '{}': {}", key, deleted > 0);
        Ok(deleted > 0)
    }

    async fn delete_many(&self, keys: &[String]) -> CatalogResult<u64> {
        if !self.is_enabled() || keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let deleted: u64 = conn
            .del(keys)
            .await
            .map_err(|e| CatalogError::Cache(format!("Failed to delete {} keys: {e}", keys.len())))?;

        Ok(deleted)
    }

    async fn exists(&self, key: &str) -> CatalogResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let exists: bool = conn
            .exists(key)
            .await
            .map_err(|e| CatalogError::Cache(format!("Failed to check key '{key}': {e}")))?;

        Ok(exists)
    }

    async fn delete_pattern(&self, pattern: &str) -> CatalogResult<u64> {
        if !self.is_enabled() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let keys = Self::scan_keys(&mut conn, pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let mut deleted: u64 = 0;
        for chunk in keys.chunks(DELETE_BATCH) {
            let count: u64 = conn
                .del(chunk)
                .await
                .map_err(|e| CatalogError::Cache(format!("Failed to delete keys: {e}")))?;
            deleted += count;
        }

        debug!("Deleted {} keys matching pattern '{}'", deleted, pattern);
        Ok(deleted)
    }

    async fn count_pattern(&self, pattern: &str) -> CatalogResult<u64> {
        if !self.is_enabled() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let keys = Self::scan_keys(&mut conn, pattern).await?;
        Ok(keys.len() as u64)
    }

    async fn incr(&self, key: &str) -> CatalogResult<u64> {
        if !self.is_enabled() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let value: u64 = conn
            .incr(key, 1u64)
            .await
            .map_err(|e| CatalogError::Cache(format!("Failed to increment '{key}': {e}")))?;

        Ok(value)
    }

    async fn get_counter(&self, key: &str) -> CatalogResult<u64> {
        if !self.is_enabled() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<u64> = conn
            .get(key)
            .await
            .map_err(|e| CatalogError::Cache(format!("Failed to read counter '{key}': {e}")))?;

        Ok(value.unwrap_or(0))
    }

    async fn ping(&self) -> CatalogResult<()> {
        let mut conn = self.get_conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| CatalogError::Cache(format!("PING failed: {e}")))?;
        Ok(())
    }
}
