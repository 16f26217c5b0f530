//! Attribute definition endpoints.

use crate::{
    extractors::{ApiPath, ApiQuery, AuthenticatedUser, PaginationQuery, SortQuery, ValidatedJson},
    responses::{created, no_content, ok, ApiResponse, ApiResult, AppError},
    state::AppState,
};
use catalog_core::domain::{permissions, AttributeValidation};
use catalog_core::{AttributeId, AttributeSortField, Page, SortOrder};
use catalog_security::ClaimsExt;
use catalog_service::{
    AttributeGroupResponse, AttributeListQuery, AttributeResponse, AttributeStatsResponse, CreateAttributeRequest, UpdateAttributeRequest,
    ValidateValueRequest,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::debug;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_attributes).post(create_attribute))
        .route("/groups", get(attribute_groups))
        .route("/stats/overview", get(attribute_stats))
        .route("/name/:name", get(get_attribute_by_name))
        .route(
            "/:id",
            get(get_attribute).put(update_attribute).delete(delete_attribute),
        )
        .route("/:id/validate", post(validate_attribute_value))
}

#[utoipa::path(
    get,
    path = "/attributes",
    tag = "attributes",
    params(
        AttributeListQuery,
        PaginationQuery,
        ("sort_by" = Option<AttributeSortField>, Query, description = "Sort column"),
        ("sort_order" = Option<SortOrder>, Query, description = "asc or desc")
    ),
    responses((status = 200, description = "Page of attributes", body = Page<AttributeResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn list_attributes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<AttributeListQuery>,
    ApiQuery(pagination): ApiQuery<PaginationQuery>,
    ApiQuery(sort): ApiQuery<SortQuery<AttributeSortField>>,
) -> ApiResult<Page<AttributeResponse>> {
    user.require_permission(permissions::ATTRIBUTES_READ)?;

    let page = pagination.to_page_request(&state.pagination);
    ok(state.attribute_service.list(query, page, sort.into()).await?)
}

#[utoipa::path(
    post,
    path = "/attributes",
    tag = "attributes",
    request_body = CreateAttributeRequest,
    responses(
        (status = 201, description = "Attribute created", body = AttributeResponse),
        (status = 409, description = "Name or slug already used"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_attribute(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateAttributeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AttributeResponse>>), AppError> {
    debug!("Create attribute request: {}", request.name);
    user.require_permission(permissions::ATTRIBUTES_CREATE)?;

    let attribute = state.attribute_service.create(request).await?;
    Ok(created(attribute))
}

#[utoipa::path(
    get,
    path = "/attributes/groups",
    tag = "attributes",
    responses((status = 200, description = "Attributes by display group", body = Vec<AttributeGroupResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn attribute_groups(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Vec<AttributeGroupResponse>> {
    user.require_permission(permissions::ATTRIBUTES_READ)?;
    ok(state.attribute_service.groups().await?)
}

#[utoipa::path(
    get,
    path = "/attributes/stats/overview",
    tag = "attributes",
    responses((status = 200, description = "Attribute statistics", body = AttributeStatsResponse)),
    security(("bearer_auth" = []))
)]
pub async fn attribute_stats(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<AttributeStatsResponse> {
    user.require_permission(permissions::ATTRIBUTES_READ)?;
    ok(state.attribute_service.stats().await?)
}

#[utoipa::path(
    get,
    path = "/attributes/name/{name}",
    tag = "attributes",
    params(("name" = String, Path, description = "Attribute name")),
    responses(
        (status = 200, description = "Attribute", body = AttributeResponse),
        (status = 404, description = "Attribute not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_attribute_by_name(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(name): ApiPath<String>,
) -> ApiResult<AttributeResponse> {
    user.require_permission(permissions::ATTRIBUTES_READ)?;
    ok(state.attribute_service.get_by_name(&name).await?)
}

#[utoipa::path(
    get,
    path = "/attributes/{id}",
    tag = "attributes",
    params(("id" = AttributeId, Path, description = "Attribute id")),
    responses(
        (status = 200, description = "Attribute", body = AttributeResponse),
        (status = 404, description = "Attribute not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_attribute(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<AttributeId>,
) -> ApiResult<AttributeResponse> {
    user.require_permission(permissions::ATTRIBUTES_READ)?;
    ok(state.attribute_service.get(id).await?)
}

/// The value type can only change while no product uses the attribute.
#[utoipa::path(
    put,
    path = "/attributes/{id}",
    tag = "attributes",
    params(("id" = AttributeId, Path, description = "Attribute id")),
    request_body = UpdateAttributeRequest,
    responses(
        (status = 200, description = "Attribute updated", body = AttributeResponse),
        (status = 404, description = "Attribute not found"),
        (status = 409, description = "Name taken or type change on a used attribute")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_attribute(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<AttributeId>,
    ValidatedJson(request): ValidatedJson<UpdateAttributeRequest>,
) -> ApiResult<AttributeResponse> {
    debug!("Update attribute request: {}", id);
    user.require_permission(permissions::ATTRIBUTES_UPDATE)?;
    ok(state.attribute_service.update(id, request).await?)
}

#[utoipa::path(
    delete,
    path = "/attributes/{id}",
    tag = "attributes",
    params(("id" = AttributeId, Path, description = "Attribute id")),
    responses(
        (status = 204, description = "Attribute deleted"),
        (status = 404, description = "Attribute not found"),
        (status = 409, description = "Attribute still used by products")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_attribute(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<AttributeId>,
) -> Result<StatusCode, AppError> {
    debug!("Delete attribute request: {}", id);
    user.require_permission(permissions::ATTRIBUTES_DELETE)?;

    state.attribute_service.delete(id).await?;
    Ok(no_content())
}

/// Dry-run of a value against the attribute's type and rules.
#[utoipa::path(
    post,
    path = "/attributes/{id}/validate",
    tag = "attributes",
    params(("id" = AttributeId, Path, description = "Attribute id")),
    request_body = ValidateValueRequest,
    responses(
        (status = 200, description = "Validation outcome", body = AttributeValidation),
        (status = 404, description = "Attribute not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn validate_attribute_value(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<AttributeId>,
    Json(request): Json<ValidateValueRequest>,
) -> ApiResult<AttributeValidation> {
    user.require_permission(permissions::ATTRIBUTES_READ)?;
    ok(state.attribute_service.validate_value(id, request.value).await?)
}
