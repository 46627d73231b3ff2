//! # docrepo Audit
//!
//! Append-only audit trail recording who changed which entity, with
//! before/after snapshots.

mod audit_log;
mod record;
mod sink;

pub use audit_log::{AuditLog, AuditStats};
pub use record::{AuditRecord, AuditTrace};
pub use sink::{AuditError, AuditSink, CollectionAuditSink};
