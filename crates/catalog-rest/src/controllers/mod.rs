//! REST API controllers.

pub mod attribute_controller;
pub mod auth_controller;
pub mod cache_controller;
pub mod category_controller;
pub mod health_controller;
pub mod product_controller;
pub mod user_controller;

pub use health_controller::*;
