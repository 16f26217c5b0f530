//! Cache administration endpoints. All require `cache.manage`.

use crate::{
    extractors::{ApiPath, ApiQuery, AuthenticatedUser},
    responses::{ok, ApiResult},
    state::AppState,
};
use catalog_core::domain::permissions;
use catalog_core::{CategoryId, ProductId};
use catalog_security::ClaimsExt;
use catalog_service::{
    CacheClearResponse, CacheHealthResponse, CacheStatsResponse, CacheWarmResponse, InvalidateProductQuery,
    MessageResponse,
};
use axum::{
    extract::State,
    routing::{delete, get, post},
    Router,
};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(cache_health))
        .route("/stats", get(cache_stats))
        .route("/warm", post(warm_cache))
        .route("/invalidate/category/:id", delete(invalidate_category))
        .route("/invalidate/product/:id", delete(invalidate_product))
        .route("/invalidate/search", delete(invalidate_search))
        .route("/clear", delete(clear_cache))
}

#[utoipa::path(
    get,
    path = "/cache/health",
    tag = "cache",
    responses((status = 200, description = "Cache backend health", body = CacheHealthResponse)),
    security(("bearer_auth" = []))
)]
pub async fn cache_health(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<CacheHealthResponse> {
    user.require_permission(permissions::CACHE_MANAGE)?;
    ok(state.cache_admin_service.health().await)
}

#[utoipa::path(
    get,
    path = "/cache/stats",
    tag = "cache",
    responses((status = 200, description = "Key counts and hit rate", body = CacheStatsResponse)),
    security(("bearer_auth" = []))
)]
pub async fn cache_stats(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<CacheStatsResponse> {
    user.require_permission(permissions::CACHE_MANAGE)?;
    ok(state.cache_admin_service.stats().await)
}

#[utoipa::path(
    post,
    path = "/cache/warm",
    tag = "cache",
    responses((status = 200, description = "Warm-up outcome", body = CacheWarmResponse)),
    security(("bearer_auth" = []))
)]
pub async fn warm_cache(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<CacheWarmResponse> {
    user.require_permission(permissions::CACHE_MANAGE)?;
    info!("Cache warm-up requested by {}", user.username);
    ok(state.cache_admin_service.warm().await)
}

#[utoipa::path(
    delete,
    path = "/cache/invalidate/category/{id}",
    tag = "cache",
    params(("id" = CategoryId, Path, description = "Category id")),
    responses((status = 200, description = "Category entries dropped", body = MessageResponse)),
    security(("bearer_auth" = []))
)]
pub async fn invalidate_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<CategoryId>,
) -> ApiResult<MessageResponse> {
    user.require_permission(permissions::CACHE_MANAGE)?;
    state.cache_admin_service.invalidate_category(id).await?;
    ok(MessageResponse::new(format!("Cache invalidated for category {id}")))
}

#[utoipa::path(
    delete,
    path = "/cache/invalidate/product/{id}",
    tag = "cache",
    params(("id" = ProductId, Path, description = "Product id"), InvalidateProductQuery),
    responses((status = 200, description = "Product entries dropped", body = MessageResponse)),
    security(("bearer_auth" = []))
)]
pub async fn invalidate_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<InvalidateProductQuery>,
) -> ApiResult<MessageResponse> {
    user.require_permission(permissions::CACHE_MANAGE)?;
    state.cache_admin_service.invalidate_product(id, query.sku).await?;
    ok(MessageResponse::new(format!("Cache invalidated for product {id}")))
}

#[utoipa::path(
    delete,
    path = "/cache/invalidate/search",
    tag = "cache",
    responses((status = 200, description = "Search results dropped", body = MessageResponse)),
    security(("bearer_auth" = []))
)]
pub async fn invalidate_search(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<MessageResponse> {
    user.require_permission(permissions::CACHE_MANAGE)?;
    state.cache_admin_service.invalidate_search().await?;
    ok(MessageResponse::new("Search cache invalidated"))
}

#[utoipa::path(
    delete,
    path = "/cache/clear",
    tag = "cache",
    responses((status = 200, description = "Every catalog entry dropped", body = CacheClearResponse)),
    security(("bearer_auth" = []))
)]
pub async fn clear_cache(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<CacheClearResponse> {
    user.require_permission(permissions::CACHE_MANAGE)?;
    info!("Cache clear requested by {}", user.username);
    ok(state.cache_admin_service.clear_all().await?)
}
