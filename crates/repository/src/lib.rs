//! # docrepo Repository
//!
//! The generic repository: every create/read/update/delete goes through
//! access control, validation, optimistic concurrency and audit, in that
//! order, for any entity type.

mod generic_repository;
mod query;

pub use generic_repository::GenericRepository;
pub use query::ListQuery;

// Re-export contracts
pub use audit::{AuditLog, AuditRecord, AuditSink, AuditTrace, CollectionAuditSink};
pub use rbac::AccessControl;
pub use shared::{
    CrudOperation, DocumentCollection, Entity, EntityMeta, ErrorKind, RepositoryError, Result,
    ValidationResult,
};
