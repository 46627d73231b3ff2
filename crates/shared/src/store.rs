//! Document storage port
//!
//! The repository talks to storage only through [`DocumentCollection`]: a
//! handle bound to one collection offering single-document atomic
//! operations. Entities travel as JSON documents keyed by field name.

use crate::entity::{DELETED_FIELD, ID_FIELD};
use crate::error::StorageError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A stored document
pub type Document = serde_json::Map<String, Value>;

/// One field condition of a [`Filter`]
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    Ne(String, Value),
}

impl Condition {
    fn matches(&self, document: &Document) -> bool {
        match self {
            Condition::Eq(field, value) => document.get(field).unwrap_or(&Value::Null) == value,
            Condition::Ne(field, value) => document.get(field).unwrap_or(&Value::Null) != value,
        }
    }
}

/// Conjunction of field conditions. A missing field compares as `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Filter matching every document
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new().eq(ID_FIELD, id.into())
    }

    /// Documents not soft-deleted
    pub fn not_deleted() -> Self {
        Self::new().ne(DELETED_FIELD, true)
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.into(), value.into()));
        self
    }

    pub fn ne(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Ne(field.into(), value.into()));
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|c| c.matches(document))
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Field-level modification applied by [`DocumentCollection::update_one`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Document,
    current_date: Vec<String>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a fixed value
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    /// Set a field to the store's current time
    pub fn current_date(mut self, field: impl Into<String>) -> Self {
        self.current_date.push(field.into());
        self
    }

    /// Apply to a document, using `now` for current-date fields
    pub fn apply(&self, document: &mut Document, now: DateTime<Utc>) -> Result<(), StorageError> {
        for (field, value) in &self.set {
            document.insert(field.clone(), value.clone());
        }
        if !self.current_date.is_empty() {
            let now = serde_json::to_value(now)?;
            for field in &self.current_date {
                document.insert(field.clone(), now.clone());
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.current_date.is_empty()
    }
}

/// Outcome of a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl WriteResult {
    pub fn acknowledged(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
        }
    }

    pub fn unacknowledged() -> Self {
        Self {
            acknowledged: false,
            matched_count: 0,
            modified_count: 0,
        }
    }
}

/// Handle to one collection of documents.
///
/// Every method must be atomic with respect to a single document: the match
/// and the mutation of `replace_one`/`update_one` may not interleave with
/// another writer.
pub trait DocumentCollection: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// First document matching the filter
    fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StorageError>;

    /// All matching documents, in insertion order
    fn find_many(&self, filter: &Filter) -> Result<Vec<Document>, StorageError>;

    /// Insert a document; fails on a duplicate `_id`
    fn insert_one(&self, document: Document) -> Result<(), StorageError>;

    /// Replace the first document matching the filter
    fn replace_one(&self, filter: &Filter, document: Document) -> Result<WriteResult, StorageError>;

    /// Apply a field update to the first document matching the filter
    fn update_one(&self, filter: &Filter, update: &Update) -> Result<WriteResult, StorageError>;
}

/// Serialize a value into a document
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StorageError> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        other => Err(StorageError::InvalidDocument(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Deserialize a document into a value
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, StorageError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}
