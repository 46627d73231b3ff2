//! AuditSink - where audit records are appended

use crate::record::AuditRecord;
use shared::{to_document, DocumentCollection, StorageError};
use std::sync::Arc;
use thiserror::Error;

/// Failure to append an audit record
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Audit log lock poisoned")]
    LockPoisoned,
}

/// Pluggable, append-only destination for audit records.
///
/// Object-safe so repositories can hold an `Arc<dyn AuditSink>`.
pub trait AuditSink: Send + Sync {
    /// Append one record
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

impl<S: AuditSink + ?Sized> AuditSink for Arc<S> {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        (**self).record(record)
    }
}

/// Sink inserting each record as a document of a collection
/// (`AuditTraces` by convention)
pub struct CollectionAuditSink {
    collection: Arc<dyn DocumentCollection>,
}

impl CollectionAuditSink {
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self { collection }
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }
}

impl AuditSink for CollectionAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let document = to_document(record)?;
        self.collection.insert_one(document)?;
        Ok(())
    }
}
