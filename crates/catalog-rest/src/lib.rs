//! # Catalog REST
//!
//! HTTP layer of the product catalog built on Axum: controllers for
//! categories, products, attributes, authentication and cache
//! administration, plus the auth middleware and OpenAPI document.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod router;
pub mod state;

pub use middleware::AuthMiddlewareState;
pub use router::*;
pub use state::*;
