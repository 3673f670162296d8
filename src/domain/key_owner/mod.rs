//! Key owner domain
//!
//! An owner groups keys and carries the path rule that every one of its keys
//! is restricted to.

mod entity;
mod repository;
mod validation;

pub use entity::{KeyOwner, OwnerName, PathPattern};
#[cfg(test)]
pub use repository::MockOwnerRepository;
pub use repository::OwnerRepository;
pub use validation::{validate_owner_name, OwnerValidationError};
