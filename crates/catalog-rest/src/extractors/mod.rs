//! Custom Axum extractors.

mod claims;
mod pagination;
mod params;
mod validated;

pub use claims::*;
pub use pagination::*;
pub use params::*;
pub use validated::*;
