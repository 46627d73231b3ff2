//! # docrepo shared
//!
//! Contracts and types used by every docrepo crate: the entity contract,
//! validation results, object ids, the document storage port, errors and
//! configuration.

pub mod config;
pub mod entity;
pub mod error;
pub mod object_id;
pub mod store;
pub mod validation;

// Re-exports
pub use config::*;
pub use entity::*;
pub use error::*;
pub use object_id::{is_object_id, new_id, ObjectId};
pub use store::*;
pub use validation::ValidationResult;
