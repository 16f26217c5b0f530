//! Application state for Axum handlers.

use async_trait::async_trait;
use catalog_config::PaginationConfig;
use catalog_service::{AttributeService, AuthService, CacheAdminService, CategoryService, ProductService};
use std::sync::Arc;

/// A dependency that must answer before `/ready` reports ready.
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self) -> Result<(), String>;
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub category_service: Arc<dyn CategoryService>,
    pub product_service: Arc<dyn ProductService>,
    pub attribute_service: Arc<dyn AttributeService>,
    pub auth_service: Arc<dyn AuthService>,
    pub cache_admin_service: Arc<dyn CacheAdminService>,
    pub pagination: PaginationConfig,
    pub readiness: Vec<Arc<dyn ReadinessCheck>>,
}

impl AppState {
    pub fn new(
        category_service: Arc<dyn CategoryService>,
        product_service: Arc<dyn ProductService>,
        attribute_service: Arc<dyn AttributeService>,
        auth_service: Arc<dyn AuthService>,
        cache_admin_service: Arc<dyn CacheAdminService>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            category_service,
            product_service,
            attribute_service,
            auth_service,
            cache_admin_service,
            pagination,
            readiness: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_readiness_check(mut self, check: Arc<dyn ReadinessCheck>) -> Self {
        self.readiness.push(check);
        self
    }
}
