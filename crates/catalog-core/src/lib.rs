//! # Catalog Core
//!
//! Core types, traits, and error definitions for the product catalog service.
//! This crate holds the domain model shared by every layer of the workspace.

pub mod domain;
pub mod error;
pub mod id;
pub mod pagination;
pub mod result;
pub mod traits;
pub mod validation;

pub use error::*;
pub use id::*;
pub use pagination::*;
pub use result::*;
pub use traits::*;
pub use validation::*;
