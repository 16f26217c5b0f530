//! Cache key generators for consistent key naming.
//!
//! Single-entity keys are stable and deleted explicitly on writes.
//! Collection keys embed the namespace generation (`g{gen}`), so bumping the
//! generation orphans every collection entry of that namespace at once.

use catalog_core::{AttributeId, CatalogResult, CategoryId, ProductId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Prefix for all cache keys.
pub const CACHE_PREFIX: &str = "catalog";

/// Independent invalidation domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheNamespace {
    Category,
    Product,
    Search,
    Attribute,
}

impl CacheNamespace {
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Category, Self::Product, Self::Search, Self::Attribute]
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Product => "product",
            Self::Search => "search",
            Self::Attribute => "attribute",
        }
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hex `xxh3_64` of the canonical JSON form of query parameters.
///
/// Object keys are written in sorted order, so two parameter sets with the
/// same fields share a hash regardless of field order.
pub fn query_hash<T: Serialize + ?Sized>(params: &T) -> CatalogResult<String> {
    let value = serde_json::to_value(params)?;
    let mut canonical = String::new();
    write_canonical(&value, &mut canonical);
    Ok(format!("{:016x}", xxh3_64(canonical.as_bytes())))
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[must_use]
pub fn generation(namespace: CacheNamespace) -> String {
    format!("{CACHE_PREFIX}:{namespace}:gen")
}

/// Glob matching every key of a namespace.
#[must_use]
pub fn namespace_pattern(namespace: CacheNamespace) -> String {
    format!("{CACHE_PREFIX}:{namespace}:*")
}

#[must_use]
pub fn all_pattern() -> String {
    format!("{CACHE_PREFIX}:*")
}

// ============ Category ============

#[must_use]
pub fn category_by_id(id: CategoryId) -> String {
    format!("{CACHE_PREFIX}:category:cat:{id}")
}

#[must_use]
pub fn category_by_slug(slug: &str) -> String {
    format!("{CACHE_PREFIX}:category:slug:{slug}")
}

#[must_use]
pub fn category_tree(gen: u64) -> String {
    format!("{CACHE_PREFIX}:category:tree:g{gen}:full")
}

#[must_use]
pub fn category_children(gen: u64, id: CategoryId) -> String {
    format!("{CACHE_PREFIX}:category:children:g{gen}:{id}")
}

/// Breadcrumbs (ancestors plus self).
#[must_use]
pub fn category_path(gen: u64, id: CategoryId) -> String {
    format!("{CACHE_PREFIX}:category:path:g{gen}:{id}")
}

#[must_use]
pub fn category_attributes(gen: u64, id: CategoryId) -> String {
    format!("{CACHE_PREFIX}:category:attrs:g{gen}:{id}")
}

#[must_use]
pub fn category_list(gen: u64, hash: &str) -> String {
    format!("{CACHE_PREFIX}:category:list:g{gen}:{hash}")
}

// ============ Product ============

#[must_use]
pub fn product_by_id(id: ProductId) -> String {
    format!("{CACHE_PREFIX}:product:prod:{id}")
}

#[must_use]
pub fn product_by_sku(sku: &str) -> String {
    format!("{CACHE_PREFIX}:product:sku:{sku}")
}

#[must_use]
pub fn product_list(gen: u64, hash: &str) -> String {
    format!("{CACHE_PREFIX}:product:list:g{gen}:{hash}")
}

#[must_use]
pub fn products_by_category(gen: u64, id: CategoryId, include_subcategories: bool) -> String {
    format!("{CACHE_PREFIX}:product:cat:g{gen}:{id}:subs:{include_subcategories}")
}

#[must_use]
pub fn featured_products(gen: u64, limit: u32) -> String {
    format!("{CACHE_PREFIX}:product:featured:g{gen}:{limit}")
}

#[must_use]
pub fn product_stats(gen: u64) -> String {
    format!("{CACHE_PREFIX}:product:stats:g{gen}:overview")
}

/// Every `prod:{id}` entry.
#[must_use]
pub fn product_entities_pattern() -> String {
    format!("{CACHE_PREFIX}:product:prod:*")
}

/// Every `sku:{sku}` entry.
#[must_use]
pub fn product_sku_pattern() -> String {
    format!("{CACHE_PREFIX}:product:sku:*")
}

// ============ Search ============

#[must_use]
pub fn search_results(gen: u64, hash: &str) -> String {
    format!("{CACHE_PREFIX}:search:products:results:g{gen}:{hash}")
}

// ============ Attribute ============

#[must_use]
pub fn attribute_by_id(id: AttributeId) -> String {
    format!("{CACHE_PREFIX}:attribute:attr:{id}")
}
