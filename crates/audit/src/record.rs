//! AuditRecord - one immutable entry of the audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{new_id, Document};
use std::fmt;

/// Mutation recorded by an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditTrace {
    Create,
    Update,
    Delete,
}

impl AuditTrace {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditTrace::Create => "CREATE",
            AuditTrace::Update => "UPDATE",
            AuditTrace::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AuditTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub trace: AuditTrace,
    /// State before the mutation; absent for CREATE and DELETE
    pub old_entity: Option<Document>,
    /// State after the mutation; absent for DELETE
    pub new_entity: Option<Document>,
}

impl AuditRecord {
    /// Build a record stamped with the current UTC time
    pub fn new(
        user_id: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        trace: AuditTrace,
        old_entity: Option<Document>,
        new_entity: Option<Document>,
    ) -> Self {
        Self {
            id: new_id(),
            timestamp: Utc::now(),
            user_id: user_id.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            trace,
            old_entity,
            new_entity,
        }
    }
}
