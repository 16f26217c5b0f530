//! Small helpers shared by the services.

use catalog_core::domain::Slug;
use catalog_core::{CatalogError, CatalogResult};

/// Uses the explicit slug when given, otherwise derives one from `name`.
pub(crate) fn resolve_slug(explicit: Option<&str>, name: &str) -> CatalogResult<Slug> {
    let slug = match explicit {
        Some(slug) => Slug::new(slug),
        None => Slug::from_name(name),
    };
    slug.map_err(|e| CatalogError::validation(format!("slug: {e}")))
}
