//! Application builder: wires repositories, cache, services and the router.

use async_trait::async_trait;
use axum::Router;
use catalog_config::{AppConfig, RedisConfig};
use catalog_core::{CatalogResult, HealthCheck, HealthStatus};
use catalog_repository::{
    DatabasePool, PgAttributeRepository, PgCategoryRepository, PgProductRepository, PgRoleRepository,
    PgUserRepository,
};
use catalog_rest::{create_router, AppState, AuthMiddlewareState, ReadinessCheck};
use catalog_security::{PasswordHasher, TokenProvider};
use catalog_service::{
    AttributeService, AttributeServiceImpl, AuthService, AuthServiceImpl, CacheAdminService, CacheAdminServiceImpl,
    CacheCoordinator, CacheInterface, CategoryService, CategoryServiceImpl, ProductService, ProductServiceImpl,
    RedisCacheService,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Fully wired application, ready to serve.
pub struct Application {
    pub router: Router,
    pub db_pool: Arc<DatabasePool>,
    pub cache_admin: Arc<dyn CacheAdminService>,
}

/// Application builder for constructing the server.
pub struct AppBuilder {
    config: AppConfig,
    db_pool: Option<Arc<DatabasePool>>,
    cache: Option<Arc<dyn CacheInterface>>,
}

impl AppBuilder {
    /// Creates a new application builder.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            db_pool: None,
            cache: None,
        }
    }

    /// Uses an existing database pool instead of connecting.
    #[must_use]
    pub fn with_database_pool(mut self, pool: Arc<DatabasePool>) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Uses an existing cache backend instead of building one from `redis`.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CacheInterface>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Connects what was not injected and builds the router.
    pub async fn build(self) -> CatalogResult<Application> {
        let config = self.config;

        let db_pool = match self.db_pool {
            Some(pool) => pool,
            None => catalog_repository::create_pool(&config.database).await?,
        };
        if config.database.run_migrations {
            db_pool.run_migrations().await?;
        }

        let cache = match self.cache {
            Some(cache) => cache,
            None => create_cache(&config.redis),
        };
        let coordinator = Arc::new(CacheCoordinator::new(cache, &config.cache));

        let categories = Arc::new(PgCategoryRepository::new(db_pool.clone()));
        let products = Arc::new(PgProductRepository::new(db_pool.clone()));
        let attributes = Arc::new(PgAttributeRepository::new(db_pool.clone()));
        let users = Arc::new(PgUserRepository::new(db_pool.clone()));
        let roles = Arc::new(PgRoleRepository::new(db_pool.clone()));

        let security_config = Arc::new(config.security.clone());
        let token_provider = Arc::new(TokenProvider::new(security_config.clone()));

        let category_service: Arc<dyn CategoryService> =
            Arc::new(CategoryServiceImpl::new(categories.clone(), coordinator.clone()));
        let product_service: Arc<dyn ProductService> = Arc::new(ProductServiceImpl::new(
            products.clone(),
            categories.clone(),
            attributes.clone(),
            coordinator.clone(),
        ));
        let attribute_service: Arc<dyn AttributeService> =
            Arc::new(AttributeServiceImpl::new(attributes, categories.clone(), coordinator.clone()));
        let auth_service: Arc<dyn AuthService> = Arc::new(AuthServiceImpl::new(
            users,
            roles,
            Arc::new(PasswordHasher::new()),
            security_config,
        ));
        let cache_admin: Arc<dyn CacheAdminService> = Arc::new(CacheAdminServiceImpl::new(
            coordinator,
            category_service.clone(),
            product_service.clone(),
            categories,
            products,
        ));

        let state = AppState::new(
            category_service,
            product_service,
            attribute_service,
            auth_service,
            cache_admin.clone(),
            config.pagination.clone(),
        )
        .with_readiness_check(Arc::new(DatabaseReadiness(db_pool.clone())));

        let auth_state = AuthMiddlewareState::new(token_provider, config.security.auth_enabled);
        let router = create_router(state, auth_state, &config.server);

        Ok(Application {
            router,
            db_pool,
            cache_admin,
        })
    }
}

/// Builds the Redis-backed cache. Falls back to a no-op cache when Redis is
/// disabled or the pool cannot be created.
pub fn create_cache(config: &RedisConfig) -> Arc<dyn CacheInterface> {
    if !config.enabled {
        warn!("Redis is disabled; running without cache");
        return Arc::new(RedisCacheService::disabled());
    }

    let mut redis_cfg = deadpool_redis::Config::from_url(&config.url);
    let mut pool_config = deadpool_redis::PoolConfig::new(config.pool_size);
    pool_config.timeouts.wait = Some(Duration::from_secs(config.timeout_secs));
    pool_config.timeouts.create = Some(Duration::from_secs(config.timeout_secs));
    redis_cfg.pool = Some(pool_config);

    match redis_cfg.create_pool(Some(deadpool_redis::Runtime::Tokio1)) {
        Ok(pool) => {
            info!("Redis cache pool created (max size {})", config.pool_size);
            Arc::new(RedisCacheService::new(Arc::new(pool)))
        }
        Err(e) => {
            warn!("Failed to create Redis pool, running without cache: {}", e);
            Arc::new(RedisCacheService::disabled())
        }
    }
}

/// Readiness fails while PostgreSQL is unreachable.
struct DatabaseReadiness(Arc<DatabasePool>);

#[async_trait]
impl ReadinessCheck for DatabaseReadiness {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<(), String> {
        match HealthCheck::check(self.0.as_ref()).await {
            HealthStatus::Unhealthy(message) => Err(message),
            HealthStatus::Healthy | HealthStatus::Degraded(_) => Ok(()),
        }
    }
}
