//! Cache administration DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Key count and generation of one cache namespace.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NamespaceStats {
    pub namespace: String,
    pub keys: u64,
    pub generation: u64,
}

/// Cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CacheStatsResponse {
    pub enabled: bool,
    pub namespaces: Vec<NamespaceStats>,
    pub total_keys: u64,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, zero before the first lookup.
    pub hit_rate: f64,
    pub invalidations: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CacheHealthStatus {
    Healthy,
    Disabled,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CacheHealthResponse {
    pub status: CacheHealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of a warm-up run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CacheWarmResponse {
    /// Names of the entries that were loaded.
    pub warmed: Vec<String>,
    pub failed: Vec<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CacheClearResponse {
    pub keys_deleted: u64,
}

/// Extra keys for product invalidation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvalidateProductQuery {
    /// A SKU the product may still be cached under, such as one it had before a rename.
    pub sku: Option<String>,
}
