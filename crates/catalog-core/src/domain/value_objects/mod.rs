//! Value objects of the catalog domain.

mod attribute;
mod category_path;
mod email;
mod money;
mod product;
mod role;
mod slug;

pub use attribute::*;
pub use category_path::*;
pub use email::*;
pub use money::*;
pub use product::*;
pub use role::*;
pub use slug::*;
