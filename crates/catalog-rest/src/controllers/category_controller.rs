//! Category hierarchy endpoints.

use crate::{
    extractors::{ApiPath, ApiQuery, AuthenticatedUser, ValidatedJson},
    responses::{created, no_content, ok, ApiResponse, ApiResult, AppError},
    state::AppState,
};
use catalog_core::domain::permissions;
use catalog_core::{AttributeId, CategoryId};
use catalog_security::ClaimsExt;
use catalog_service::{
    AssignAttributesRequest, BreadcrumbItem, CategoryAttributeResponse, CategoryListQuery, CategoryResponse,
    CategoryTreeNode, CreateCategoryRequest, MoveCategoryRequest, UpdateCategoryRequest,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::debug;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/tree", get(category_tree))
        .route("/roots", get(root_categories))
        .route("/slug/:slug", get(get_category_by_slug))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/:id/move", post(move_category))
        .route("/:id/children", get(category_children))
        .route("/:id/breadcrumbs", get(category_breadcrumbs))
        .route(
            "/:id/attributes",
            get(category_attributes).post(assign_category_attributes),
        )
        .route("/:id/attributes/:attribute_id", delete(unassign_category_attribute))
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    params(CategoryListQuery),
    responses((status = 200, description = "Categories ordered by path", body = Vec<CategoryResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn list_categories(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<CategoryListQuery>,
) -> ApiResult<Vec<CategoryResponse>> {
    user.require_permission(permissions::CATEGORIES_READ)?;
    ok(state.category_service.list(query).await?)
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 404, description = "Parent not found"),
        (status = 409, description = "Slug already used"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), AppError> {
    debug!("Create category request: {}", request.name);
    user.require_permission(permissions::CATEGORIES_CREATE)?;

    let category = state.category_service.create(request).await?;
    Ok(created(category))
}

/// Whole hierarchy as nested nodes.
#[utoipa::path(
    get,
    path = "/categories/tree",
    tag = "categories",
    responses((status = 200, description = "Category forest", body = Vec<CategoryTreeNode>)),
    security(("bearer_auth" = []))
)]
pub async fn category_tree(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<Vec<CategoryTreeNode>> {
    user.require_permission(permissions::CATEGORIES_READ)?;
    ok(state.category_service.tree().await?)
}

#[utoipa::path(
    get,
    path = "/categories/roots",
    tag = "categories",
    responses((status = 200, description = "Top-level categories", body = Vec<CategoryResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn root_categories(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<Vec<CategoryResponse>> {
    user.require_permission(permissions::CATEGORIES_READ)?;
    ok(state.category_service.roots().await?)
}

#[utoipa::path(
    get,
    path = "/categories/slug/{slug}",
    tag = "categories",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_category_by_slug(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<CategoryResponse> {
    user.require_permission(permissions::CATEGORIES_READ)?;
    ok(state.category_service.get_by_slug(&slug).await?)
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "categories",
    params(("id" = CategoryId, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<CategoryId>,
) -> ApiResult<CategoryResponse> {
    user.require_permission(permissions::CATEGORIES_READ)?;
    ok(state.category_service.get(id).await?)
}

#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "categories",
    params(("id" = CategoryId, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Slug already used")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<CategoryId>,
    ValidatedJson(request): ValidatedJson<UpdateCategoryRequest>,
) -> ApiResult<CategoryResponse> {
    debug!("Update category request: {}", id);
    user.require_permission(permissions::CATEGORIES_UPDATE)?;
    ok(state.category_service.update(id, request).await?)
}

/// Fails while the category still has children or products.
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "categories",
    params(("id" = CategoryId, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category has children or products")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode, AppError> {
    debug!("Delete category request: {}", id);
    user.require_permission(permissions::CATEGORIES_DELETE)?;

    state.category_service.delete(id).await?;
    Ok(no_content())
}

/// Re-parent a category together with its subtree.
#[utoipa::path(
    post,
    path = "/categories/{id}/move",
    tag = "categories",
    params(("id" = CategoryId, Path, description = "Category id")),
    request_body = MoveCategoryRequest,
    responses(
        (status = 200, description = "Category moved", body = CategoryResponse),
        (status = 404, description = "Category or new parent not found"),
        (status = 422, description = "Move would create a cycle")
    ),
    security(("bearer_auth" = []))
)]
pub async fn move_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<CategoryId>,
    Json(request): Json<MoveCategoryRequest>,
) -> ApiResult<CategoryResponse> {
    debug!("Move category {} under {:?}", id, request.new_parent_id);
    user.require_permission(permissions::CATEGORIES_UPDATE)?;
    ok(state.category_service.move_category(id, request).await?)
}

#[utoipa::path(
    get,
    path = "/categories/{id}/children",
    tag = "categories",
    params(("id" = CategoryId, Path, description = "Category id")),
    responses(
        (status = 200, description = "Direct children", body = Vec<CategoryResponse>),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn category_children(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<CategoryId>,
) -> ApiResult<Vec<CategoryResponse>> {
    user.require_permission(permissions::CATEGORIES_READ)?;
    ok(state.category_service.children(id).await?)
}

#[utoipa::path(
    get,
    path = "/categories/{id}/breadcrumbs",
    tag = "categories",
    params(("id" = CategoryId, Path, description = "Category id")),
    responses(
        (status = 200, description = "Root-first ancestor chain ending with the category", body = Vec<BreadcrumbItem>),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn category_breadcrumbs(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<CategoryId>,
) -> ApiResult<Vec<BreadcrumbItem>> {
    user.require_permission(permissions::CATEGORIES_READ)?;
    ok(state.category_service.breadcrumbs(id).await?)
}

#[utoipa::path(
    get,
    path = "/categories/{id}/attributes",
    tag = "categories",
    params(("id" = CategoryId, Path, description = "Category id")),
    responses(
        (status = 200, description = "Attributes assigned to the category", body = Vec<CategoryAttributeResponse>),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn category_attributes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<CategoryId>,
) -> ApiResult<Vec<CategoryAttributeResponse>> {
    user.require_permission(permissions::ATTRIBUTES_READ)?;
    ok(state.attribute_service.category_attributes(id).await?)
}

#[utoipa::path(
    post,
    path = "/categories/{id}/attributes",
    tag = "categories",
    params(("id" = CategoryId, Path, description = "Category id")),
    request_body = AssignAttributesRequest,
    responses(
        (status = 200, description = "Attributes assigned", body = Vec<CategoryAttributeResponse>),
        (status = 404, description = "Category or attribute not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_category_attributes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<CategoryId>,
    ValidatedJson(request): ValidatedJson<AssignAttributesRequest>,
) -> ApiResult<Vec<CategoryAttributeResponse>> {
    debug!("Assign {} attributes to category {}", request.attributes.len(), id);
    user.require_permission(permissions::ATTRIBUTES_UPDATE)?;
    ok(state.attribute_service.assign_to_category(id, request).await?)
}

#[utoipa::path(
    delete,
    path = "/categories/{id}/attributes/{attribute_id}",
    tag = "categories",
    params(
        ("id" = CategoryId, Path, description = "Category id"),
        ("attribute_id" = AttributeId, Path, description = "Attribute id")
    ),
    responses(
        (status = 204, description = "Attribute unassigned"),
        (status = 404, description = "Assignment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn unassign_category_attribute(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath((id, attribute_id)): ApiPath<(CategoryId, AttributeId)>,
) -> Result<StatusCode, AppError> {
    debug!("Unassign attribute {} from category {}", attribute_id, id);
    user.require_permission(permissions::ATTRIBUTES_UPDATE)?;

    state.attribute_service.unassign_from_category(id, attribute_id).await?;
    Ok(no_content())
}
