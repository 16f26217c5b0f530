//! Caching infrastructure for the service layer.
//!
//! [`CacheInterface`] abstracts the store, [`RedisCacheService`] implements it
//! over a deadpool-redis pool, and [`CacheCoordinator`] owns the key scheme,
//! cache-aside reads and invalidation rules.

mod cache_interface;
pub mod cache_keys;
pub mod coordinator;
mod redis_cache;

pub use cache_interface::CacheInterface;
pub use cache_keys::CacheNamespace;
pub use coordinator::{register_metrics, AttributeChange, CacheCoordinator, CacheTtls};
pub use redis_cache::RedisCacheService;
