//! OpenAPI document served at `/api-docs/openapi.json`.

use crate::controllers::{
    attribute_controller, auth_controller, cache_controller, category_controller, health_controller,
    product_controller, user_controller,
};
use catalog_core::domain::{AttributeType, ProductStatus};
use catalog_core::{ErrorResponse, FieldError, PageInfo};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Product Catalog API",
        version = "1.0.0",
        description = "Hierarchical categories, products with typed attributes, and cache administration",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        auth_controller::register,
        auth_controller::login,
        auth_controller::refresh_token,
        auth_controller::get_current_user,
        user_controller::assign_roles,
        category_controller::list_categories,
        category_controller::create_category,
        category_controller::category_tree,
        category_controller::root_categories,
        category_controller::get_category_by_slug,
        category_controller::get_category,
        category_controller::update_category,
        category_controller::delete_category,
        category_controller::move_category,
        category_controller::category_children,
        category_controller::category_breadcrumbs,
        category_controller::category_attributes,
        category_controller::assign_category_attributes,
        category_controller::unassign_category_attribute,
        product_controller::list_products,
        product_controller::create_product,
        product_controller::search_products,
        product_controller::featured_products,
        product_controller::product_stats,
        product_controller::bulk_products,
        product_controller::get_product_by_sku,
        product_controller::products_by_category,
        product_controller::get_product,
        product_controller::update_product,
        product_controller::delete_product,
        product_controller::change_product_status,
        product_controller::set_product_attributes,
        attribute_controller::list_attributes,
        attribute_controller::create_attribute,
        attribute_controller::attribute_groups,
        attribute_controller::attribute_stats,
        attribute_controller::get_attribute_by_name,
        attribute_controller::get_attribute,
        attribute_controller::update_attribute,
        attribute_controller::delete_attribute,
        attribute_controller::validate_attribute_value,
        cache_controller::cache_health,
        cache_controller::cache_stats,
        cache_controller::warm_cache,
        cache_controller::invalidate_category,
        cache_controller::invalidate_product,
        cache_controller::invalidate_search,
        cache_controller::clear_cache,
        health_controller::health_check,
        health_controller::readiness_check,
        health_controller::liveness_check,
    ),
    components(
        schemas(ErrorResponse, FieldError, PageInfo, ProductStatus, AttributeType)
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "users", description = "Role assignment"),
        (name = "categories", description = "Category hierarchy"),
        (name = "products", description = "Products, search and bulk operations"),
        (name = "attributes", description = "Attribute definitions"),
        (name = "cache", description = "Cache administration"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Registers the JWT bearer scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
