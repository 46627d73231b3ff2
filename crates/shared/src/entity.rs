//! Entity contract - the shape every stored entity must satisfy
//!
//! Entities embed an [`EntityMeta`] with `#[serde(flatten)]` and implement
//! [`Entity`] to expose it:
//!
//! ```ignore
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Customer {
//!     #[serde(flatten)]
//!     pub meta: EntityMeta,
//!     pub name: String,
//! }
//!
//! impl Entity for Customer {
//!     fn meta(&self) -> &EntityMeta { &self.meta }
//!     fn meta_mut(&mut self) -> &mut EntityMeta { &mut self.meta }
//!
//!     fn validate(&self, operation: CrudOperation, allow_id: bool) -> ValidationResult {
//!         let mut result = self.meta.validate(operation, allow_id);
//!         if self.name.is_empty() {
//!             result.add("name", "Name is required.");
//!         }
//!         result
//!     }
//! }
//! ```

use crate::object_id::new_id;
use crate::validation::ValidationResult;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored field holding the entity identity
pub const ID_FIELD: &str = "_id";
/// Stored field holding the concurrency token
pub const TOKEN_FIELD: &str = "timestamp";
/// Stored field holding the soft-delete flag
pub const DELETED_FIELD: &str = "is_deleted";

/// The kind of operation an entity is validated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrudOperation {
    Read,
    Create,
    Update,
    Delete,
}

impl fmt::Display for CrudOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrudOperation::Read => "read",
            CrudOperation::Create => "create",
            CrudOperation::Update => "update",
            CrudOperation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Identity, concurrency token and soft-delete flag shared by all entities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Opaque identity; absent until the first successful create
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Set on every successful write; doubles as "last modified at"
    #[serde(rename = "timestamp", default)]
    pub concurrency_token: Option<DateTime<Utc>>,

    /// Logically deleted but physically retained
    #[serde(rename = "is_deleted", default)]
    pub soft_deleted: bool,
}

impl EntityMeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Meta for an entity whose id is chosen by the caller
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// The id, treating an empty string as absent
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn has_id(&self) -> bool {
        self.id().is_some()
    }

    /// Generate an id when none is set. Never overwrites an existing id.
    pub fn assign_id_if_absent(&mut self) -> &str {
        if !self.has_id() {
            self.id = Some(new_id());
        }
        self.id.as_deref().unwrap_or_default()
    }

    /// Rules every entity enforces regardless of its own fields
    pub fn validate(&self, operation: CrudOperation, allow_caller_supplied_id: bool) -> ValidationResult {
        let mut result = ValidationResult::new();

        if operation != CrudOperation::Create && self.concurrency_token.is_none() {
            result.add(TOKEN_FIELD, "Timestamp must be set.");
        }

        if operation == CrudOperation::Create && !allow_caller_supplied_id && self.has_id() {
            result.add(ID_FIELD, "Id must be null.");
        }

        if operation != CrudOperation::Create && !self.has_id() {
            result.add(ID_FIELD, "Id must be specified.");
        }

        result
    }
}

/// Contract implemented by every entity type stored through a repository
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync {
    fn meta(&self) -> &EntityMeta;

    fn meta_mut(&mut self) -> &mut EntityMeta;

    /// Validate for an operation. Implementations extend the base rules of
    /// [`EntityMeta::validate`] with their own field checks.
    fn validate(&self, operation: CrudOperation, allow_caller_supplied_id: bool) -> ValidationResult {
        self.meta().validate(operation, allow_caller_supplied_id)
    }

    fn id(&self) -> Option<&str> {
        self.meta().id()
    }

    fn concurrency_token(&self) -> Option<DateTime<Utc>> {
        self.meta().concurrency_token
    }

    fn is_soft_deleted(&self) -> bool {
        self.meta().soft_deleted
    }

    fn assign_id_if_absent(&mut self) -> &str {
        self.meta_mut().assign_id_if_absent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_id::is_object_id;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Address {
        #[serde(flatten)]
        meta: EntityMeta,
        zip: String,
    }

    impl Entity for Address {
        fn meta(&self) -> &EntityMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut EntityMeta {
            &mut self.meta
        }

        fn validate(&self, operation: CrudOperation, allow_id: bool) -> ValidationResult {
            let mut result = self.meta.validate(operation, allow_id);
            if self.zip.len() != 5 {
                result.add("zip", "Zip code must have 5 digits.");
            }
            result
        }
    }

    fn address(zip: &str) -> Address {
        Address {
            meta: EntityMeta::new(),
            zip: zip.to_string(),
        }
    }

    #[test]
    fn test_create_fresh_entity_is_valid() {
        let errors = address("75001").validate(CrudOperation::Create, false);
        assert!(!errors.has_errors());
    }

    #[test]
    fn test_create_with_id_depends_on_flag() {
        let mut entity = address("75001");
        entity.meta.id = Some("507f1f77bcf86cd799439011".to_string());

        let rejected = entity.validate(CrudOperation::Create, false);
        assert_eq!(rejected.get(ID_FIELD), Some("Id must be null."));

        let accepted = entity.validate(CrudOperation::Create, true);
        assert!(!accepted.has_errors());
    }

    #[test]
    fn test_update_requires_id_and_token() {
        let errors = address("75001").validate(CrudOperation::Update, false);
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(ID_FIELD));
        assert!(errors.contains(TOKEN_FIELD));
    }

    #[test]
    fn test_non_create_operations_share_base_rules() {
        for operation in [CrudOperation::Read, CrudOperation::Update, CrudOperation::Delete] {
            let errors = address("75001").validate(operation, true);
            assert!(errors.contains(ID_FIELD), "{} should require an id", operation);
        }
    }

    #[test]
    fn test_empty_id_counts_as_absent() {
        let mut entity = address("75001");
        entity.meta.id = Some(String::new());
        entity.meta.concurrency_token = Some(Utc::now());

        let errors = entity.validate(CrudOperation::Update, false);
        assert_eq!(errors.get(ID_FIELD), Some("Id must be specified."));
    }

    #[test]
    fn test_custom_rules_are_appended() {
        let errors = address("123").validate(CrudOperation::Update, false);
        assert_eq!(errors.len(), 3);
        assert!(errors.contains("zip"));
    }

    #[test]
    fn test_assign_id_if_absent_is_idempotent() {
        let mut entity = address("75001");
        let first = entity.assign_id_if_absent().to_string();
        let second = entity.assign_id_if_absent().to_string();

        assert_eq!(first, second);
        assert!(is_object_id(&first));
    }

    #[test]
    fn test_assign_id_keeps_caller_id() {
        let mut entity = address("75001");
        entity.meta = EntityMeta::with_id("customer-42");
        assert_eq!(entity.assign_id_if_absent(), "customer-42");
    }

    #[test]
    fn test_meta_field_names() {
        let mut entity = address("75001");
        entity.assign_id_if_absent();
        entity.meta.concurrency_token = Some(Utc::now());

        let json = serde_json::to_value(&entity).unwrap();
        assert!(json.get(ID_FIELD).is_some());
        assert!(json.get(TOKEN_FIELD).is_some());
        assert_eq!(json[DELETED_FIELD], false);
        assert_eq!(json["zip"], "75001");
    }

    #[test]
    fn test_fresh_entity_omits_id() {
        let json = serde_json::to_value(address("75001")).unwrap();
        assert!(json.get(ID_FIELD).is_none());
        assert!(json[TOKEN_FIELD].is_null());
    }

    #[test]
    fn test_crud_operation_display() {
        assert_eq!(CrudOperation::Create.to_string(), "create");
        assert_eq!(CrudOperation::Delete.to_string(), "delete");
    }
}
