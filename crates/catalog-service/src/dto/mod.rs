//! Data Transfer Objects (DTOs).

mod attribute_dto;
mod auth_dto;
mod cache_dto;
mod category_dto;
mod product_dto;

pub use attribute_dto::*;
pub use auth_dto::*;
pub use cache_dto::*;
pub use category_dto::*;
pub use product_dto::*;
