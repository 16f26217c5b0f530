//! # Catalog Security
//!
//! JWT authentication, argon2 password hashing and permission-based
//! authorization for the catalog API.

pub mod jwt;
pub mod password;
pub mod rbac;

pub use jwt::*;
pub use password::*;
pub use rbac::*;
