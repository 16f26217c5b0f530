//! Permission checks over token claims.

mod checker;

pub use checker::*;
