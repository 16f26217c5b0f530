//! # Catalog Service
//!
//! Use cases of the product catalog: categories, products, attributes,
//! authentication and cache administration. Reads go through the Redis
//! cache layer; writes invalidate it after the database commit.

pub mod cache;
pub mod dto;
pub mod attribute_service;
pub mod auth_service;
pub mod cache_admin_service;
pub mod category_service;
pub mod product_service;

mod support;
#[cfg(test)]
mod testing;

pub use cache::*;
pub use dto::*;
pub use attribute_service::*;
pub use auth_service::*;
pub use cache_admin_service::*;
pub use category_service::*;
pub use product_service::*;
