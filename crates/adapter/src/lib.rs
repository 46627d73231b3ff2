//! # docrepo Adapter Layer
//!
//! Implementations of the `DocumentCollection` storage port.
//!
//! ## Structure
//!
//! - `repository/` - in-memory collections with JSON snapshot persistence

pub mod repository;

pub use repository::in_memory::{InMemoryCollection, InMemoryDatabase};
