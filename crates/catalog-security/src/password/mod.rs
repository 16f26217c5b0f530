//! Password hashing and strength policy.

mod hasher;
mod policy;

pub use hasher::*;
pub use policy::*;
