//! docrepo CLI library: the `Note` entity, its access policy and the
//! commands wiring them to a file-backed store.

pub mod commands;
pub mod context;
pub mod note;
