//! GenericRepository - the orchestrator
//!
//! Sequences ACL -> validation -> concurrency -> storage -> audit for every
//! operation on one entity type.
//!
//! # Invariants
//! - Access control is evaluated before any mutation or disclosure.
//! - Updates are a compare-and-swap on `(id, token)` at the storage layer,
//!   so of two writers holding the same token at most one succeeds.
//! - Listings never return soft-deleted entities. `get_by_id` does.
//! - Audit failures are logged and never undo the mutation.

use std::marker::PhantomData;
use std::sync::Arc;

use audit::{AuditRecord, AuditSink, AuditTrace};
use chrono::{DateTime, Duration, Utc};
use rbac::AccessControl;
use serde_json::Value;
use shared::{
    CrudOperation, Document, DocumentCollection, Entity, Filter, RepositoryError, Result, Update,
    WriteResult, DELETED_FIELD, TOKEN_FIELD,
};
use tracing::{debug, info, warn};

use crate::query::ListQuery;

/// Repository for entities of type `T` guarded by the policy `A`
pub struct GenericRepository<T, A> {
    collection: Arc<dyn DocumentCollection>,
    acl: A,
    audit: Option<Arc<dyn AuditSink>>,
    entity_type: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T, A> GenericRepository<T, A>
where
    T: Entity,
    A: AccessControl<T>,
{
    /// Create a repository over `collection`. `entity_type` names the type
    /// in error messages and audit records.
    pub fn new(collection: Arc<dyn DocumentCollection>, acl: A, entity_type: impl Into<String>) -> Self {
        Self {
            collection,
            acl,
            audit: None,
            entity_type: entity_type.into(),
            _entity: PhantomData,
        }
    }

    /// Record an audit trace for every successful mutation
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn acl(&self) -> &A {
        &self.acl
    }

    pub fn is_audit_enabled(&self) -> bool {
        self.audit.is_some()
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// Fetch one entity. Soft-deleted entities are returned too.
    pub fn get_by_id(&self, id: &str, user_id: &str) -> Result<T> {
        debug!(entity_type = %self.entity_type, entity_id = id, user_id, "get_by_id");

        let found = match self.collection.find_one(&Filter::by_id(id))? {
            Some(document) => Some(self.decode(document)?),
            None => None,
        };

        match found {
            Some(entity) if !self.acl.can_read(&entity, user_id) => {
                Err(self.forbidden(user_id, Some(id), CrudOperation::Read))
            }
            Some(entity) => Ok(entity),
            None => Err(RepositoryError::NotFound {
                user_id: user_id.to_string(),
                entity_type: self.entity_type.clone(),
                entity_id: id.to_string(),
            }),
        }
    }

    /// Every non-deleted entity matching the query that `user_id` may read.
    ///
    /// Access control runs after the query is materialized, so the cost is
    /// proportional to all matching records.
    pub fn list(&self, user_id: &str, query: &ListQuery<'_, T>) -> Result<Vec<T>> {
        debug!(entity_type = %self.entity_type, user_id, "list");

        let entities = self
            .collection
            .find_many(&Filter::not_deleted())?
            .into_iter()
            .map(|document| self.decode(document))
            .collect::<Result<Vec<T>>>()?;

        let mut visible = query.apply(entities);
        visible.retain(|entity| self.acl.can_read(entity, user_id));
        Ok(visible)
    }

    /// [`GenericRepository::list`] without filter or ordering
    pub fn list_all(&self, user_id: &str) -> Result<Vec<T>> {
        self.list(user_id, &ListQuery::new())
    }

    /// Persist a new entity and return its stored form
    pub fn create(&self, mut entity: T, user_id: &str) -> Result<T> {
        debug!(entity_type = %self.entity_type, user_id, "create");

        if !self.acl.can_create(&entity, user_id) {
            return Err(self.forbidden(user_id, None, CrudOperation::Create));
        }

        let errors = entity.validate(CrudOperation::Create, true);
        if errors.has_errors() {
            return Err(self.validation_failed(user_id, entity.id(), errors));
        }

        let id = entity.assign_id_if_absent().to_string();
        entity.meta_mut().concurrency_token = Some(fresh_token(None));

        self.collection.insert_one(self.encode(&entity)?)?;
        let created = self.get_by_id(&id, user_id)?;

        self.trace(user_id, &id, AuditTrace::Create, None, Some(&created));
        info!(entity_type = %self.entity_type, entity_id = %id, user_id, "Created");
        Ok(created)
    }

    /// Replace a stored entity, provided its token still matches
    pub fn update(&self, mut entity: T, user_id: &str) -> Result<T> {
        debug!(entity_type = %self.entity_type, entity_id = ?entity.id(), user_id, "update");

        let errors = entity.validate(CrudOperation::Update, false);
        if errors.has_errors() {
            return Err(self.validation_failed(user_id, entity.id(), errors));
        }

        let id = match entity.id() {
            Some(id) => id.to_string(),
            None => {
                return Err(RepositoryError::Internal(format!(
                    "A model of type {} has no id but validate(Update) reported no errors.",
                    self.entity_type
                )))
            }
        };

        if !self.acl.can_write(&id, user_id) {
            return Err(self.forbidden(user_id, Some(&id), CrudOperation::Update));
        }

        entity.assign_id_if_absent();

        // Soft-deleted records are out of reach of the update path.
        let live = Filter::by_id(&id).ne(DELETED_FIELD, true);
        let current_document = self.collection.find_one(&live)?;
        let (current, observed_token) = match current_document {
            Some(document) => {
                let observed_token = document.get(TOKEN_FIELD).cloned().unwrap_or(Value::Null);
                (self.decode(document)?, observed_token)
            }
            None => return Err(self.conflict(user_id, &id)),
        };

        if current.concurrency_token() != entity.concurrency_token() {
            warn!(entity_type = %self.entity_type, entity_id = %id, user_id, "Stale concurrency token");
            return Err(self.conflict(user_id, &id));
        }

        // Deletion only happens through `delete`.
        entity.meta_mut().soft_deleted = current.is_soft_deleted();
        entity.meta_mut().concurrency_token = Some(fresh_token(current.concurrency_token()));

        let filter = live.eq(TOKEN_FIELD, observed_token);
        let result = self.collection.replace_one(&filter, self.encode(&entity)?)?;
        self.ensure_acknowledged(result, user_id, &id, CrudOperation::Update)?;
        if result.matched_count == 0 {
            warn!(entity_type = %self.entity_type, entity_id = %id, user_id, "Lost update race");
            return Err(self.conflict(user_id, &id));
        }

        let updated = self.get_by_id(&id, user_id)?;

        self.trace(user_id, &id, AuditTrace::Update, Some(&current), Some(&updated));
        info!(entity_type = %self.entity_type, entity_id = %id, user_id, "Updated");
        Ok(updated)
    }

    /// Soft-delete: flag the record and refresh its token. No token
    /// precondition applies.
    pub fn delete(&self, id: &str, user_id: &str) -> Result<()> {
        debug!(entity_type = %self.entity_type, entity_id = id, user_id, "delete");

        if !self.acl.can_write(id, user_id) {
            return Err(self.forbidden(user_id, Some(id), CrudOperation::Delete));
        }

        let update = Update::new().set(DELETED_FIELD, true).current_date(TOKEN_FIELD);
        let result = self.collection.update_one(&Filter::by_id(id), &update)?;
        self.ensure_acknowledged(result, user_id, id, CrudOperation::Delete)?;
        if result.matched_count == 0 {
            warn!(entity_type = %self.entity_type, entity_id = id, user_id, "Delete matched no document");
        }

        self.trace(user_id, id, AuditTrace::Delete, None, None);
        info!(entity_type = %self.entity_type, entity_id = id, user_id, "Deleted");
        Ok(())
    }

    fn decode(&self, document: Document) -> Result<T> {
        serde_json::from_value(Value::Object(document)).map_err(|source| RepositoryError::Serialization {
            entity_type: self.entity_type.clone(),
            source,
        })
    }

    fn encode(&self, entity: &T) -> Result<Document> {
        let value = serde_json::to_value(entity).map_err(|source| RepositoryError::Serialization {
            entity_type: self.entity_type.clone(),
            source,
        })?;
        match value {
            Value::Object(document) => Ok(document),
            _ => Err(RepositoryError::Internal(format!(
                "{} does not serialize to a document",
                self.entity_type
            ))),
        }
    }

    fn ensure_acknowledged(
        &self,
        result: WriteResult,
        user_id: &str,
        id: &str,
        action: CrudOperation,
    ) -> Result<()> {
        if result.acknowledged {
            return Ok(());
        }
        warn!(entity_type = %self.entity_type, entity_id = id, user_id, %action, "Write not acknowledged");
        Err(RepositoryError::StorageFailure {
            user_id: user_id.to_string(),
            entity_type: self.entity_type.clone(),
            entity_id: id.to_string(),
            action,
            message: "write was not acknowledged".to_string(),
        })
    }

    fn forbidden(&self, user_id: &str, id: Option<&str>, action: CrudOperation) -> RepositoryError {
        warn!(entity_type = %self.entity_type, entity_id = ?id, user_id, %action, "Access denied");
        RepositoryError::Forbidden {
            user_id: user_id.to_string(),
            entity_type: self.entity_type.clone(),
            entity_id: id.map(str::to_string),
            action,
        }
    }

    fn conflict(&self, user_id: &str, id: &str) -> RepositoryError {
        RepositoryError::Conflict {
            user_id: user_id.to_string(),
            entity_type: self.entity_type.clone(),
            entity_id: id.to_string(),
        }
    }

    fn validation_failed(
        &self,
        user_id: &str,
        id: Option<&str>,
        errors: shared::ValidationResult,
    ) -> RepositoryError {
        debug!(entity_type = %self.entity_type, entity_id = ?id, user_id, %errors, "Validation failed");
        RepositoryError::ValidationFailed {
            user_id: user_id.to_string(),
            entity_type: self.entity_type.clone(),
            entity_id: id.map(str::to_string),
            errors,
        }
    }

    /// Best effort: failures are logged, never returned
    fn trace(&self, user_id: &str, entity_id: &str, trace: AuditTrace, old: Option<&T>, new: Option<&T>) {
        let Some(sink) = &self.audit else {
            return;
        };

        let snapshot = |entity: Option<&T>| entity.map(|e| self.encode(e)).transpose();
        let (old_entity, new_entity) = match (snapshot(old), snapshot(new)) {
            (Ok(old_entity), Ok(new_entity)) => (old_entity, new_entity),
            (Err(err), _) | (_, Err(err)) => {
                warn!(entity_type = %self.entity_type, entity_id, %trace, error = %err, "Could not snapshot entity for audit");
                return;
            }
        };

        let record = AuditRecord::new(user_id, &self.entity_type, entity_id, trace, old_entity, new_entity);
        if let Err(err) = sink.record(&record) {
            warn!(entity_type = %self.entity_type, entity_id, %trace, error = %err, "Audit trace dropped");
        }
    }
}

/// New concurrency token. Always differs from `previous`, even when the
/// clock has not advanced since the last write.
fn fresh_token(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(previous) if now <= previous => previous + Duration::nanoseconds(1),
        _ => now,
    }
}
