//! Main application router.

use crate::{
    controllers::{
        attribute_controller, auth_controller, cache_controller, category_controller, health_controller,
        product_controller, user_controller,
    },
    middleware::{auth_middleware, logging_middleware, AuthMiddlewareState},
    openapi::ApiDoc,
    state::AppState,
};
use catalog_config::ServerConfig;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the full application router.
///
/// Versioned routes live under `server.api_prefix` behind the auth
/// middleware; health endpoints and the Swagger UI stay at the root.
pub fn create_router(state: AppState, auth_state: AuthMiddlewareState, server_config: &ServerConfig) -> Router {
    let api_router = Router::new()
        .nest("/auth", auth_controller::router())
        .nest("/users", user_controller::router())
        .nest("/categories", category_controller::router())
        .nest("/products", product_controller::router())
        .nest("/attributes", attribute_controller::router())
        .nest("/cache", cache_controller::router())
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    let router = Router::new()
        .merge(health_controller::router())
        .nest(&server_config.api_prefix, api_router)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(root))
        .layer(DefaultBodyLimit::max(server_config.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout_secs)))
        .layer(CompressionLayer::new())
        .layer(create_cors_layer(server_config))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    info!(
        "Router created with REST endpoints under {} and Swagger UI at /swagger-ui",
        server_config.api_prefix
    );
    router
}

/// CORS from `server.cors_allowed_origins`; `*` allows any origin.
fn create_cors_layer(server_config: &ServerConfig) -> CorsLayer {
    let origins = &server_config.cors_allowed_origins;
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

async fn root() -> &'static str {
    "Product Catalog API v1"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use catalog_config::{PaginationConfig, SecurityConfig};
    use catalog_core::domain::{Email, RoleName, User};
    use catalog_core::{CatalogError, CategoryId, Page, PageRequest, ProductId};
    use catalog_security::{PermissionChecker, TokenProvider};
    use catalog_service::{
        AttributeGroupResponse, CacheClearResponse, CategoryResponse, CategoryTreeNode, MockAttributeService, MockAuthService,
        MockCacheAdminService, MockCategoryService, MockProductService,
    };
    use chrono::Utc;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Default)]
    struct Mocks {
        categories: MockCategoryService,
        products: MockProductService,
        attributes: MockAttributeService,
        auth: MockAuthService,
        cache: MockCacheAdminService,
    }

    fn security_config() -> Arc<SecurityConfig> {
        Arc::new(SecurityConfig {
            jwt_secret: "router-test-secret-key-of-sufficient-length".to_string(),
            ..SecurityConfig::default()
        })
    }

    fn app(mocks: Mocks, auth_enabled: bool) -> Router {
        let state = AppState::new(
            Arc::new(mocks.categories),
            Arc::new(mocks.products),
            Arc::new(mocks.attributes),
            Arc::new(mocks.auth),
            Arc::new(mocks.cache),
            PaginationConfig::default(),
        );
        let auth_state = AuthMiddlewareState::new(Arc::new(TokenProvider::new(security_config())), auth_enabled);
        create_router(state, auth_state, &ServerConfig::default())
    }

    fn token_for(role: RoleName) -> String {
        let mut user = User::new(
            "tester".to_string(),
            Email::new_unchecked("tester@example.com".to_string()),
            "hash".to_string(),
            None,
            None,
        );
        user.roles = vec![role.to_string()];
        let permissions = PermissionChecker::role_permissions(role);
        TokenProvider::new(security_config())
            .generate_tokens(&user, &permissions)
            .unwrap()
            .access_token
    }

    fn category(name: &str) -> CategoryResponse {
        let id = CategoryId::new();
        CategoryResponse {
            id,
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: None,
            parent_id: None,
            path: id.into_inner().simple().to_string(),
            depth: 0,
            meta_title: None,
            meta_description: None,
            meta_keywords: None,
            is_active: true,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = app(Mocks::default(), true)
            .oneshot(request(Method::GET, "/health", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app(Mocks::default(), true)
            .oneshot(request(Method::GET, "/api/v1/categories/tree", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let response = app(Mocks::default(), true)
            .oneshot(request(Method::GET, "/api/v1/products/featured", Some("not-a-jwt"), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_reader_can_fetch_tree() {
        let mut mocks = Mocks::default();
        mocks.categories.expect_tree().times(1).returning(|| {
            Ok(vec![CategoryTreeNode {
                id: CategoryId::new(),
                name: "Electronics".to_string(),
                slug: "electronics".to_string(),
                depth: 0,
                is_active: true,
                sort_order: 0,
                children: Vec::new(),
            }])
        });

        let token = token_for(RoleName::User);
        let response = app(mocks, true)
            .oneshot(request(Method::GET, "/api/v1/categories/tree", Some(&token), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["slug"], "electronics");
    }

    #[tokio::test]
    async fn test_reader_cannot_create_category() {
        let mut mocks = Mocks::default();
        mocks.categories.expect_create().never();

        let token = token_for(RoleName::User);
        let response = app(mocks, true)
            .oneshot(request(
                Method::POST,
                "/api/v1/categories",
                Some(&token),
                Some(serde_json::json!({"name": "Books"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_auth_disabled_runs_as_superuser() {
        let mut mocks = Mocks::default();
        mocks
            .categories
            .expect_create()
            .times(1)
            .returning(|request| Ok(category(&request.name)));

        let response = app(mocks, false)
            .oneshot(request(
                Method::POST,
                "/api/v1/categories",
                None,
                Some(serde_json::json!({"name": "Books"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["data"]["name"], "Books");
    }

    #[tokio::test]
    async fn test_invalid_body_lists_field_errors() {
        let token = token_for(RoleName::Manager);
        let response = app(Mocks::default(), true)
            .oneshot(request(
                Method::POST,
                "/api/v1/categories",
                Some(&token),
                Some(serde_json::json!({"name": ""})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"][0]["field"], "name");
    }

    #[tokio::test]
    async fn test_service_not_found_maps_to_404() {
        let mut mocks = Mocks::default();
        mocks
            .categories
            .expect_get()
            .returning(|id| Err(CatalogError::not_found("Category", id)));

        let token = token_for(RoleName::User);
        let uri = format!("/api/v1/categories/{}", CategoryId::new());
        let response = app(mocks, true)
            .oneshot(request(Method::GET, &uri, Some(&token), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let token = token_for(RoleName::User);
        let response = app(Mocks::default(), true)
            .oneshot(request(Method::GET, "/api/v1/products/not-a-uuid", Some(&token), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_bulk_delete_requires_delete_permission() {
        let mut mocks = Mocks::default();
        mocks.products.expect_bulk().never();

        // Managers may update products but not delete them.
        let token = token_for(RoleName::Manager);
        let response = app(mocks, true)
            .oneshot(request(
                Method::POST,
                "/api/v1/products/bulk",
                Some(&token),
                Some(serde_json::json!({
                    "product_ids": [uuid::Uuid::now_v7()],
                    "operation": "delete"
                })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_product_list_applies_page_defaults() {
        let mut mocks = Mocks::default();
        mocks
            .products
            .expect_list()
            .withf(|_, page: &PageRequest, _| page.page == 2 && page.size == 100)
            .times(1)
            .returning(|_, page, _| Ok(Page::empty(page.page, page.size)));

        let token = token_for(RoleName::User);
        let response = app(mocks, true)
            .oneshot(request(
                Method::GET,
                "/api/v1/products?page=2&size=500&sort_by=price&sort_order=desc",
                Some(&token),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["page"], 2);
        assert_eq!(body["data"]["total_elements"], 0);
    }

    #[tokio::test]
    async fn test_cache_clear_requires_cache_manage() {
        let mut mocks = Mocks::default();
        mocks.cache.expect_clear_all().times(1).returning(|| Ok(CacheClearResponse { keys_deleted: 7 }));

        let user_token = token_for(RoleName::User);
        let admin_token = token_for(RoleName::Admin);
        let app = app(mocks, true);

        let denied = app
            .clone()
            .oneshot(request(Method::DELETE, "/api/v1/cache/clear", Some(&user_token), None))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let allowed = app
            .oneshot(request(Method::DELETE, "/api/v1/cache/clear", Some(&admin_token), None))
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
        assert_eq!(body_json(allowed).await["data"]["keys_deleted"], 7);
    }

    #[tokio::test]
    async fn test_invalidate_product_is_delete_with_optional_sku() {
        let mut mocks = Mocks::default();
        mocks
            .cache
            .expect_invalidate_product()
            .withf(|_, sku| sku.as_deref() == Some("OLD-1"))
            .times(1)
            .returning(|_, _| Ok(()));

        let token = token_for(RoleName::Admin);
        let app = app(mocks, true);
        let uri = format!("/api/v1/cache/invalidate/product/{}?sku=OLD-1", ProductId::new());

        let response = app
            .clone()
            .oneshot(request(Method::DELETE, &uri, Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let wrong_method = app.oneshot(request(Method::POST, &uri, Some(&token), None)).await.unwrap();
        assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_attribute_groups_are_readable() {
        let mut mocks = Mocks::default();
        mocks.attributes.expect_groups().times(1).returning(|| {
            Ok(vec![AttributeGroupResponse {
                group_name: "Default".to_string(),
                attributes: Vec::new(),
                sort_order: 0,
            }])
        });

        let response = app(mocks, true)
            .oneshot(request(
                Method::GET,
                "/api/v1/attributes/groups",
                Some(&token_for(RoleName::User)),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"][0]["group_name"], "Default");
    }
}
