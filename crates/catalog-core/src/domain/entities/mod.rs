//! Catalog and identity entities.

mod attribute;
mod category;
mod product;
mod role;
mod user;

pub use attribute::*;
pub use category::*;
pub use product::*;
pub use role::*;
pub use user::*;
