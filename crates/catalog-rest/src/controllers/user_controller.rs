//! User role management.

use crate::{
    extractors::{ApiPath, AuthenticatedUser, ValidatedJson},
    responses::{ok, ApiResult},
    state::AppState,
};
use catalog_core::domain::permissions;
use catalog_core::UserId;
use catalog_security::ClaimsExt;
use catalog_service::{AssignRolesRequest, AuthUserInfo};
use axum::{
    extract::State,
    routing::put,
    Router,
};
use tracing::debug;

pub fn router() -> Router<AppState> {
    Router::new().route("/:id/roles", put(assign_roles))
}

/// Replace the roles of a user.
#[utoipa::path(
    put,
    path = "/users/{id}/roles",
    tag = "users",
    params(("id" = UserId, Path, description = "User id")),
    request_body = AssignRolesRequest,
    responses(
        (status = 200, description = "Roles replaced", body = AuthUserInfo),
        (status = 400, description = "Unknown role"),
        (status = 403, description = "Missing users.update"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_roles(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<UserId>,
    ValidatedJson(request): ValidatedJson<AssignRolesRequest>,
) -> ApiResult<AuthUserInfo> {
    debug!("Assign roles to {}: {:?}", id, request.roles);
    user.require_permission(permissions::USERS_UPDATE)?;

    let info = state.auth_service.assign_roles(id, request).await?;
    ok(info)
}
