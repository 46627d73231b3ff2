//! Fixtures shared by the repository integration tests

#![allow(dead_code)]

use std::sync::Arc;

use adapter::{InMemoryCollection, InMemoryDatabase};
use audit::{AuditError, AuditLog, AuditRecord, AuditSink};
use rbac::AccessControl;
use repository::GenericRepository;
use serde::{Deserialize, Serialize};
use shared::{
    CrudOperation, Document, DocumentCollection, Entity, EntityMeta, Filter, StorageError, Update,
    ValidationResult, WriteResult,
};

pub const ADMIN: &str = "admin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub zip: String,
}

impl Address {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        if self.zip.len() != 5 || !self.zip.bytes().all(|b| b.is_ascii_digit()) {
            result.add("zip", "Zip code must have 5 digits.");
        }
        result
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub address: Option<Address>,
}

impl Customer {
    pub fn new(name: &str, owner: &str) -> Self {
        Self {
            meta: EntityMeta::new(),
            name: name.to_string(),
            owner: owner.to_string(),
            address: None,
        }
    }

    pub fn with_zip(mut self, zip: &str) -> Self {
        self.address = Some(Address { zip: zip.to_string() });
        self
    }
}

impl Entity for Customer {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn validate(&self, operation: CrudOperation, allow_caller_supplied_id: bool) -> ValidationResult {
        let mut result = self.meta.validate(operation, allow_caller_supplied_id);
        if self.name.trim().is_empty() {
            result.add("name", "Name is required.");
        }
        if let Some(address) = &self.address {
            result.merge("address", &address.validate());
        }
        result
    }
}

/// Owners and the admin may read and write; anyone may create a customer
/// they own. Write access by id looks the owner up in storage.
pub struct OwnerAcl {
    pub collection: Arc<InMemoryCollection>,
}

impl OwnerAcl {
    fn owner_of(&self, entity_id: &str) -> Option<String> {
        self.collection
            .find_one(&Filter::by_id(entity_id))
            .ok()
            .flatten()
            .and_then(|d| d.get("owner").and_then(|o| o.as_str()).map(str::to_string))
    }
}

impl AccessControl<Customer> for OwnerAcl {
    fn can_create(&self, entity: &Customer, user_id: &str) -> bool {
        entity.owner == user_id || user_id == ADMIN
    }

    fn can_write(&self, entity_id: &str, user_id: &str) -> bool {
        user_id == ADMIN || self.owner_of(entity_id).as_deref() == Some(user_id)
    }

    fn can_read(&self, entity: &Customer, user_id: &str) -> bool {
        entity.owner == user_id || user_id == ADMIN
    }

    fn can_read_id(&self, entity_id: &str, user_id: &str) -> bool {
        self.can_write(entity_id, user_id)
    }
}

/// Fixed answers, for exercising individual gates
#[derive(Debug, Clone, Copy)]
pub struct StaticAcl {
    pub create: bool,
    pub read: bool,
    pub write: bool,
}

impl StaticAcl {
    pub fn allow_all() -> Self {
        Self {
            create: true,
            read: true,
            write: true,
        }
    }
}

impl AccessControl<Customer> for StaticAcl {
    fn can_create(&self, _entity: &Customer, _user_id: &str) -> bool {
        self.create
    }

    fn can_write(&self, _entity_id: &str, _user_id: &str) -> bool {
        self.write
    }

    fn can_read(&self, _entity: &Customer, _user_id: &str) -> bool {
        self.read
    }

    fn can_read_id(&self, _entity_id: &str, _user_id: &str) -> bool {
        self.read
    }
}

/// Sink that always fails
pub struct FailingSink;

impl AuditSink for FailingSink {
    fn record(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        Err(AuditError::LockPoisoned)
    }
}

/// Collection whose writes after insert are never acknowledged
pub struct UnacknowledgedCollection {
    pub inner: InMemoryCollection,
}

impl DocumentCollection for UnacknowledgedCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StorageError> {
        self.inner.find_one(filter)
    }

    fn find_many(&self, filter: &Filter) -> Result<Vec<Document>, StorageError> {
        self.inner.find_many(filter)
    }

    fn insert_one(&self, document: Document) -> Result<(), StorageError> {
        self.inner.insert_one(document)
    }

    fn replace_one(&self, _filter: &Filter, _document: Document) -> Result<WriteResult, StorageError> {
        Ok(WriteResult::unacknowledged())
    }

    fn update_one(&self, _filter: &Filter, _update: &Update) -> Result<WriteResult, StorageError> {
        Ok(WriteResult::unacknowledged())
    }
}

pub struct Fixture {
    pub db: InMemoryDatabase,
    pub customers: Arc<InMemoryCollection>,
    pub audit: Arc<AuditLog>,
    pub repo: GenericRepository<Customer, OwnerAcl>,
}

/// Owner-guarded customer repository with an in-memory audit log
pub fn fixture() -> Fixture {
    let db = InMemoryDatabase::new();
    let customers = db.collection("customers");
    let audit = Arc::new(AuditLog::new(100));
    let acl = OwnerAcl {
        collection: Arc::clone(&customers),
    };
    let repo = GenericRepository::new(customers.clone(), acl, "Customer").with_audit(audit.clone());

    Fixture {
        db,
        customers,
        audit,
        repo,
    }
}

/// Repository over a fresh collection with a fixed policy and no audit
pub fn static_repo(acl: StaticAcl) -> (Arc<InMemoryCollection>, GenericRepository<Customer, StaticAcl>) {
    let collection = Arc::new(InMemoryCollection::new("customers"));
    let repo = GenericRepository::new(collection.clone(), acl, "Customer");
    (collection, repo)
}

pub fn stored(collection: &InMemoryCollection, id: &str) -> Option<Document> {
    collection.find_one(&Filter::by_id(id)).unwrap()
}
