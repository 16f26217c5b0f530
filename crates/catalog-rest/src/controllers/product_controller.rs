//! Product endpoints.

use crate::{
    extractors::{ApiPath, ApiQuery, AuthenticatedUser, PaginationQuery, SortQuery, ValidatedJson},
    responses::{created, no_content, ok, ApiResponse, ApiResult, AppError},
    state::AppState,
};
use catalog_core::domain::permissions;
use catalog_core::{CategoryId, Page, ProductId, ProductSortField, SortOrder};
use catalog_security::ClaimsExt;
use catalog_service::{
    BulkOperation, BulkOperationResult, BulkProductRequest, ByCategoryQuery, ChangeStatusRequest,
    CreateProductRequest, FeaturedQuery, ProductListQuery, ProductResponse, ProductSearchQuery,
    ProductStatsResponse, SetAttributesRequest, UpdateProductRequest,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use tracing::debug;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/featured", get(featured_products))
        .route("/stats/overview", get(product_stats))
        .route("/bulk", post(bulk_products))
        .route("/sku/:sku", get(get_product_by_sku))
        .route("/category/:id", get(products_by_category))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/:id/status", patch(change_product_status))
        .route("/:id/attributes", put(set_product_attributes))
}

#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    params(
        ProductListQuery,
        PaginationQuery,
        ("sort_by" = Option<ProductSortField>, Query, description = "Sort column"),
        ("sort_order" = Option<SortOrder>, Query, description = "asc or desc")
    ),
    responses((status = 200, description = "Page of products", body = Page<ProductResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ProductListQuery>,
    ApiQuery(pagination): ApiQuery<PaginationQuery>,
    ApiQuery(sort): ApiQuery<SortQuery<ProductSortField>>,
) -> ApiResult<Page<ProductResponse>> {
    user.require_permission(permissions::PRODUCTS_READ)?;

    let page = pagination.to_page_request(&state.pagination);
    ok(state.product_service.list(query, page, sort.into()).await?)
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 404, description = "Category not found"),
        (status = 409, description = "SKU or slug already used"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), AppError> {
    debug!("Create product request: {}", request.sku);
    user.require_permission(permissions::PRODUCTS_CREATE)?;

    let product = state.product_service.create(request).await?;
    Ok(created(product))
}

/// Filtered search; category ids expand to their subtrees.
#[utoipa::path(
    get,
    path = "/products/search",
    tag = "products",
    params(
        ProductSearchQuery,
        PaginationQuery,
        ("sort_by" = Option<ProductSortField>, Query, description = "Sort column"),
        ("sort_order" = Option<SortOrder>, Query, description = "asc or desc")
    ),
    responses(
        (status = 200, description = "Page of matching products", body = Page<ProductResponse>),
        (status = 400, description = "Malformed filter")
    ),
    security(("bearer_auth" = []))
)]
pub async fn search_products(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ProductSearchQuery>,
    ApiQuery(pagination): ApiQuery<PaginationQuery>,
    ApiQuery(sort): ApiQuery<SortQuery<ProductSortField>>,
) -> ApiResult<Page<ProductResponse>> {
    user.require_permission(permissions::PRODUCTS_READ)?;

    let page = pagination.to_page_request(&state.pagination);
    ok(state.product_service.search(query, page, sort.into()).await?)
}

#[utoipa::path(
    get,
    path = "/products/featured",
    tag = "products",
    params(FeaturedQuery),
    responses((status = 200, description = "Featured active products", body = Vec<ProductResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn featured_products(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<FeaturedQuery>,
) -> ApiResult<Vec<ProductResponse>> {
    user.require_permission(permissions::PRODUCTS_READ)?;
    ok(state.product_service.featured(query.limit).await?)
}

#[utoipa::path(
    get,
    path = "/products/stats/overview",
    tag = "products",
    responses((status = 200, description = "Catalog statistics", body = ProductStatsResponse)),
    security(("bearer_auth" = []))
)]
pub async fn product_stats(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<ProductStatsResponse> {
    user.require_permission(permissions::PRODUCTS_READ)?;
    ok(state.product_service.stats().await?)
}

/// Status change or deletion of up to 100 products.
#[utoipa::path(
    post,
    path = "/products/bulk",
    tag = "products",
    request_body = BulkProductRequest,
    responses(
        (status = 200, description = "Bulk outcome", body = BulkOperationResult),
        (status = 403, description = "Missing products.update, or products.delete for deletion")
    ),
    security(("bearer_auth" = []))
)]
pub async fn bulk_products(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<BulkProductRequest>,
) -> ApiResult<BulkOperationResult> {
    debug!("Bulk {:?} on {} products", request.operation, request.product_ids.len());
    user.require_permission(permissions::PRODUCTS_UPDATE)?;
    if request.operation == BulkOperation::Delete {
        user.require_permission(permissions::PRODUCTS_DELETE)?;
    }

    ok(state.product_service.bulk(request).await?)
}

#[utoipa::path(
    get,
    path = "/products/sku/{sku}",
    tag = "products",
    params(("sku" = String, Path, description = "Stock keeping unit")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_product_by_sku(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(sku): ApiPath<String>,
) -> ApiResult<ProductResponse> {
    user.require_permission(permissions::PRODUCTS_READ)?;
    ok(state.product_service.get_by_sku(&sku).await?)
}

#[utoipa::path(
    get,
    path = "/products/category/{id}",
    tag = "products",
    params(("id" = CategoryId, Path, description = "Category id"), ByCategoryQuery),
    responses(
        (status = 200, description = "Products of the category", body = Vec<ProductResponse>),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn products_by_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<CategoryId>,
    ApiQuery(query): ApiQuery<ByCategoryQuery>,
) -> ApiResult<Vec<ProductResponse>> {
    user.require_permission(permissions::PRODUCTS_READ)?;
    ok(state.product_service.by_category(id, query.include_subcategories).await?)
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    params(("id" = ProductId, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<ProductId>,
) -> ApiResult<ProductResponse> {
    user.require_permission(permissions::PRODUCTS_READ)?;
    ok(state.product_service.get(id).await?)
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "products",
    params(("id" = ProductId, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Product or category not found"),
        (status = 409, description = "SKU or slug already used")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<ProductId>,
    ValidatedJson(request): ValidatedJson<UpdateProductRequest>,
) -> ApiResult<ProductResponse> {
    debug!("Update product request: {}", id);
    user.require_permission(permissions::PRODUCTS_UPDATE)?;
    ok(state.product_service.update(id, request).await?)
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "products",
    params(("id" = ProductId, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode, AppError> {
    debug!("Delete product request: {}", id);
    user.require_permission(permissions::PRODUCTS_DELETE)?;

    state.product_service.delete(id).await?;
    Ok(no_content())
}

#[utoipa::path(
    patch,
    path = "/products/{id}/status",
    tag = "products",
    params(("id" = ProductId, Path, description = "Product id")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ProductResponse),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_product_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<ProductId>,
    Json(request): Json<ChangeStatusRequest>,
) -> ApiResult<ProductResponse> {
    debug!("Change status of {} to {:?}", id, request.status);
    user.require_permission(permissions::PRODUCTS_UPDATE)?;
    ok(state.product_service.change_status(id, request.status).await?)
}

/// Replace the attribute values of a product.
#[utoipa::path(
    put,
    path = "/products/{id}/attributes",
    tag = "products",
    params(("id" = ProductId, Path, description = "Product id")),
    request_body = SetAttributesRequest,
    responses(
        (status = 200, description = "Attribute values replaced", body = ProductResponse),
        (status = 400, description = "Invalid or duplicate values"),
        (status = 404, description = "Product or attribute not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_product_attributes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<ProductId>,
    ValidatedJson(request): ValidatedJson<SetAttributesRequest>,
) -> ApiResult<ProductResponse> {
    user.require_permission(permissions::PRODUCTS_UPDATE)?;
    ok(state.product_service.set_attributes(id, request).await?)
}
