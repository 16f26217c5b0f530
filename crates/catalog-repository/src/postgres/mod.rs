//! PostgreSQL repository implementations.

mod attribute_repository;
mod category_repository;
mod product_repository;
mod role_repository;
mod user_repository;

pub use attribute_repository::PgAttributeRepository;
pub use category_repository::PgCategoryRepository;
pub use product_repository::PgProductRepository;
pub use role_repository::PgRoleRepository;
pub use user_repository::PgUserRepository;

use catalog_core::{CatalogError, Page, PageRequest};

/// Builds an `ILIKE` pattern matching `term` anywhere, escaping wildcards.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Non-blank search term as an `ILIKE` pattern.
pub(crate) fn optional_pattern(term: Option<&str>) -> Option<String> {
    term.filter(|t| !t.trim().is_empty()).map(like_pattern)
}

pub(crate) fn page_of<T>(content: Vec<T>, page: PageRequest, total: i64) -> Page<T> {
    Page::new(content, page.page, page.size, u64::try_from(total).unwrap_or_default())
}

pub(crate) fn limit_offset(page: PageRequest) -> (i64, i64) {
    (
        i64::try_from(page.limit()).unwrap_or(i64::MAX),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

/// Maps a row value that fails domain validation.
pub(crate) fn corrupt(what: &str, err: impl std::fmt::Display) -> CatalogError {
    CatalogError::Internal(format!("Invalid {what} in database: {err}"))
}
