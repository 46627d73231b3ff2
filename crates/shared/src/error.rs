//! Error types for docrepo

use crate::entity::CrudOperation;
use crate::validation::ValidationResult;
use thiserror::Error;

fn with_id(entity_id: &Option<String>) -> String {
    entity_id
        .as_deref()
        .map(|id| format!(" with id '{}'", id))
        .unwrap_or_default()
}

/// Failure reported by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Duplicate key: a document with id '{id}' already exists in '{collection}'")]
    DuplicateKey { collection: String, id: String },

    #[error("Lock poisoned for collection '{0}'")]
    LockPoisoned(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a [`RepositoryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Forbidden,
    NotFound,
    ValidationFailed,
    Conflict,
    StorageFailure,
    Internal,
}

/// Typed failure of a repository operation
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The access control policy denied the operation
    #[error("User '{user_id}' does not have the right to {action} a '{entity_type}'{}", with_id(.entity_id))]
    Forbidden {
        user_id: String,
        entity_type: String,
        entity_id: Option<String>,
        action: CrudOperation,
    },

    #[error("{entity_type} with id {entity_id} does not exist.")]
    NotFound {
        user_id: String,
        entity_type: String,
        entity_id: String,
    },

    /// Carries every field error, never just the first one
    #[error("Validation failed for '{entity_type}'{}: {errors}", with_id(.entity_id))]
    ValidationFailed {
        user_id: String,
        entity_type: String,
        entity_id: Option<String>,
        errors: ValidationResult,
    },

    /// Optimistic concurrency token mismatch; re-fetch and retry
    #[error("Current record '{entity_type}' with id '{entity_id}' has been updated by another user.")]
    Conflict {
        user_id: String,
        entity_type: String,
        entity_id: String,
    },

    /// The backend did not acknowledge a write
    #[error("Unable to {action} document for user {user_id} in collection '{entity_type}' with documentId '{entity_id}': {message}")]
    StorageFailure {
        user_id: String,
        entity_type: String,
        entity_id: String,
        action: CrudOperation,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Could not (de)serialize '{entity_type}': {source}")]
    Serialization {
        entity_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// An entity implementation broke its own contract
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepositoryError::Forbidden { .. } => ErrorKind::Forbidden,
            RepositoryError::NotFound { .. } => ErrorKind::NotFound,
            RepositoryError::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            RepositoryError::Conflict { .. } => ErrorKind::Conflict,
            RepositoryError::StorageFailure { .. } | RepositoryError::Storage(_) => {
                ErrorKind::StorageFailure
            }
            RepositoryError::Serialization { .. } | RepositoryError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether the caller may retry after re-fetching the entity
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// User the failed operation ran as
    pub fn user_id(&self) -> Option<&str> {
        match self {
            RepositoryError::Forbidden { user_id, .. }
            | RepositoryError::NotFound { user_id, .. }
            | RepositoryError::ValidationFailed { user_id, .. }
            | RepositoryError::Conflict { user_id, .. }
            | RepositoryError::StorageFailure { user_id, .. } => Some(user_id.as_str()),
            _ => None,
        }
    }

    /// Entity the failed operation targeted, when it had an id
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            RepositoryError::Forbidden { entity_id, .. }
            | RepositoryError::ValidationFailed { entity_id, .. } => entity_id.as_deref(),
            RepositoryError::NotFound { entity_id, .. }
            | RepositoryError::Conflict { entity_id, .. }
            | RepositoryError::StorageFailure { entity_id, .. } => Some(entity_id.as_str()),
            _ => None,
        }
    }

    /// Field errors, for `ValidationFailed`
    pub fn validation_errors(&self) -> Option<&ValidationResult> {
        match self {
            RepositoryError::ValidationFailed { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_message_with_id() {
        let err = RepositoryError::Forbidden {
            user_id: "u2".to_string(),
            entity_type: "Customer".to_string(),
            entity_id: Some("abc".to_string()),
            action: CrudOperation::Delete,
        };
        assert_eq!(
            err.to_string(),
            "User 'u2' does not have the right to delete a 'Customer' with id 'abc'"
        );
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_forbidden_message_without_id() {
        let err = RepositoryError::Forbidden {
            user_id: "u2".to_string(),
            entity_type: "Customer".to_string(),
            entity_id: None,
            action: CrudOperation::Create,
        };
        assert_eq!(
            err.to_string(),
            "User 'u2' does not have the right to create a 'Customer'"
        );
    }

    #[test]
    fn test_only_conflict_is_retryable() {
        let conflict = RepositoryError::Conflict {
            user_id: "u1".to_string(),
            entity_type: "Customer".to_string(),
            entity_id: "abc".to_string(),
        };
        assert!(conflict.is_retryable());

        let missing = RepositoryError::NotFound {
            user_id: "u1".to_string(),
            entity_type: "Customer".to_string(),
            entity_id: "abc".to_string(),
        };
        assert!(!missing.is_retryable());
        assert_eq!(missing.to_string(), "Customer with id abc does not exist.");
    }

    #[test]
    fn test_validation_errors_accessor() {
        let err = RepositoryError::ValidationFailed {
            user_id: "u1".to_string(),
            entity_type: "Customer".to_string(),
            entity_id: Some("abc".to_string()),
            errors: ValidationResult::new().with("name", "Name is required."),
        };
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(
            err.validation_errors().and_then(|e| e.get("name")),
            Some("Name is required.")
        );
        assert!(err.to_string().contains("name: Name is required."));
        assert!(err.to_string().starts_with("Validation failed for 'Customer' with id 'abc'"));
    }

    #[test]
    fn test_failures_carry_user_and_entity() {
        let conflict = RepositoryError::Conflict {
            user_id: "u1".to_string(),
            entity_type: "Customer".to_string(),
            entity_id: "abc".to_string(),
        };
        assert_eq!(conflict.user_id(), Some("u1"));
        assert_eq!(conflict.entity_id(), Some("abc"));

        let on_create = RepositoryError::ValidationFailed {
            user_id: "u2".to_string(),
            entity_type: "Customer".to_string(),
            entity_id: None,
            errors: ValidationResult::new().with("name", "Name is required."),
        };
        assert_eq!(on_create.user_id(), Some("u2"));
        assert_eq!(on_create.entity_id(), None);

        let internal = RepositoryError::Internal("broken".to_string());
        assert_eq!(internal.user_id(), None);
    }

    #[test]
    fn test_storage_error_kind() {
        let err: RepositoryError = StorageError::LockPoisoned("customers".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
    }
}
