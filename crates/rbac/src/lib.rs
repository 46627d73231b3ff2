//! # docrepo RBAC
//!
//! Access control contract consulted by the generic repository before any
//! mutation or disclosure.
//!
//! ## Components
//!
//! - `AccessControl` - per-entity-type create/read/write policy

pub mod access_control;

pub use access_control::AccessControl;
