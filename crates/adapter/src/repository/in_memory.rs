//! In-Memory Document Store
//!
//! Collections held in memory, optionally snapshotted to a JSON file.
//! Useful for testing, development and small single-process deployments.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde_json::Value;
use shared::{new_id, Document, DocumentCollection, Filter, StorageError, Update, WriteResult, ID_FIELD};
use tracing::debug;

/// In-memory collection
///
/// Thread-safe implementation using RwLock. Each port call holds the lock
/// for its whole match-and-mutate, so single-document writes are atomic.
#[derive(Debug, Clone)]
pub struct InMemoryCollection {
    name: String,
    documents: Arc<RwLock<Vec<Document>>>,
}

impl InMemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_documents(name, Vec::new())
    }

    fn with_documents(name: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            name: name.into(),
            documents: Arc::new(RwLock::new(documents)),
        }
    }

    /// Copy of every stored document, in insertion order
    pub fn snapshot(&self) -> Result<Vec<Document>, StorageError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| StorageError::LockPoisoned(self.name.clone()))?;
        Ok(documents.clone())
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| StorageError::LockPoisoned(self.name.clone()))?;
        Ok(documents.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl DocumentCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StorageError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| StorageError::LockPoisoned(self.name.clone()))?;
        Ok(documents.iter().find(|d| filter.matches(d)).cloned())
    }

    fn find_many(&self, filter: &Filter) -> Result<Vec<Document>, StorageError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| StorageError::LockPoisoned(self.name.clone()))?;
        Ok(documents
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }

    fn insert_one(&self, mut document: Document) -> Result<(), StorageError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StorageError::LockPoisoned(self.name.clone()))?;

        let id = match document.get(ID_FIELD) {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::String(_)) | Some(Value::Null) | None => {
                let id = new_id();
                document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
            Some(other) => {
                return Err(StorageError::InvalidDocument(format!(
                    "'{}' must be a string, got {}",
                    ID_FIELD, other
                )))
            }
        };

        if documents.iter().any(|d| d.get(ID_FIELD).and_then(Value::as_str) == Some(id.as_str())) {
            return Err(StorageError::DuplicateKey {
                collection: self.name.clone(),
                id,
            });
        }

        documents.push(document);
        Ok(())
    }

    fn replace_one(&self, filter: &Filter, mut document: Document) -> Result<WriteResult, StorageError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StorageError::LockPoisoned(self.name.clone()))?;

        let Some(current) = documents.iter_mut().find(|d| filter.matches(d)) else {
            return Ok(WriteResult::acknowledged(0, 0));
        };

        // The identity of a stored document never changes.
        match (current.get(ID_FIELD), document.get(ID_FIELD)) {
            (Some(existing), Some(replacement)) if existing != replacement => {
                return Err(StorageError::InvalidDocument(format!(
                    "replacement would change '{}' from {} to {}",
                    ID_FIELD, existing, replacement
                )));
            }
            (Some(existing), None) => {
                document.insert(ID_FIELD.to_string(), existing.clone());
            }
            _ => {}
        }

        let modified = u64::from(*current != document);
        *current = document;
        Ok(WriteResult::acknowledged(1, modified))
    }

    fn update_one(&self, filter: &Filter, update: &Update) -> Result<WriteResult, StorageError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StorageError::LockPoisoned(self.name.clone()))?;

        let Some(current) = documents.iter_mut().find(|d| filter.matches(d)) else {
            return Ok(WriteResult::acknowledged(0, 0));
        };

        let mut updated = current.clone();
        update.apply(&mut updated, Utc::now())?;
        let modified = u64::from(*current != updated);
        *current = updated;
        Ok(WriteResult::acknowledged(1, modified))
    }
}

/// In-memory database: named collections sharing one snapshot file
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    collections: Arc<RwLock<BTreeMap<String, Arc<InMemoryCollection>>>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to a collection, created empty on first use
    pub fn collection(&self, name: &str) -> Arc<InMemoryCollection> {
        let mut collections = match self.collections.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InMemoryCollection::new(name)))
            .clone()
    }

    pub fn collection_names(&self) -> Vec<String> {
        match self.collections.read() {
            Ok(guard) => guard.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        }
    }

    /// Load a snapshot written by [`InMemoryDatabase::save_to_file`].
    /// A missing file yields an empty database.
    pub fn load_from_file(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            debug!(path = %path.display(), "No snapshot file, starting empty");
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)?;
        let snapshot: BTreeMap<String, Vec<Document>> = serde_json::from_str(&content)?;

        let collections = snapshot
            .into_iter()
            .map(|(name, documents)| {
                let collection = Arc::new(InMemoryCollection::with_documents(name.clone(), documents));
                (name, collection)
            })
            .collect();

        debug!(path = %path.display(), "Loaded snapshot");
        Ok(Self {
            collections: Arc::new(RwLock::new(collections)),
        })
    }

    /// Write every collection to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), StorageError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StorageError::LockPoisoned("<database>".to_string()))?;

        let mut snapshot = BTreeMap::new();
        for (name, collection) in collections.iter() {
            snapshot.insert(name.clone(), collection.snapshot()?);
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;

        debug!(path = %path.display(), collections = snapshot.len(), "Saved snapshot");
        Ok(())
    }
}
