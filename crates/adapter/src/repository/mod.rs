//! Persistence Adapters - storage port implementations
//!
//! These implement `shared::DocumentCollection`.

pub mod in_memory;
