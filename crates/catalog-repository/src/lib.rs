//! # Catalog Repository
//!
//! Data access for the catalog, backed by PostgreSQL through SQLx.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn CategoryRepository>   (traits.rs)
//! PgCategoryRepository               (postgres/)
//!   ↓
//! PostgreSQL (ltree, JSONB)
//! ```
//!
//! Migrations live in `migrations/` and are embedded into the binary by
//! [`DatabasePool::run_migrations`].

pub mod pool;
pub mod postgres;
pub mod traits;

pub use pool::*;
pub use postgres::*;
pub use traits::*;
