//! # Catalog Server Library
//!
//! Wiring and startup utilities for the product catalog server.

pub mod app;
pub mod startup;

pub use app::{create_cache, AppBuilder, Application};
