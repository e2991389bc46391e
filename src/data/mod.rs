//! Data layer
//!
//! Entity models and the repository that owns the persisted collections.

pub mod models;
pub mod repository;

pub use models::*;
pub use repository::Repository;
