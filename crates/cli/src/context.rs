//! Store context shared by the commands: configuration, the loaded
//! snapshot and the repositories built over it.

use std::path::Path;
use std::sync::Arc;

use adapter::InMemoryDatabase;
use audit::{AuditLog, AuditRecord, CollectionAuditSink};
use repository::GenericRepository;
use shared::{from_document, DocumentCollection, Filter, StoreConfig};
use tracing::debug;

use crate::note::{Note, NoteAcl};

/// Collection holding notes
pub const NOTES_COLLECTION: &str = "notes";

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "docrepo.json";

pub struct Context {
    config: StoreConfig,
    db: InMemoryDatabase,
}

impl Context {
    /// Load the snapshot named by the configuration
    pub fn open(config: StoreConfig) -> anyhow::Result<Self> {
        let db = InMemoryDatabase::load_from_file(&config.data_file)?;
        debug!(data_file = %config.data_file.display(), "Store opened");
        Ok(Self { config, db })
    }

    /// Resolve configuration: explicit file, then `docrepo.json` in the
    /// working directory, then defaults.
    pub fn resolve_config(path: Option<&Path>) -> anyhow::Result<StoreConfig> {
        match path {
            Some(path) => Ok(StoreConfig::from_file(path)?),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Ok(StoreConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?)
            }
            None => Ok(StoreConfig::default()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Note repository, audited when the configuration says so
    pub fn notes(&self) -> GenericRepository<Note, NoteAcl> {
        let collection = self.db.collection(NOTES_COLLECTION);
        let acl = NoteAcl::new(collection.clone());
        let repo = GenericRepository::new(collection, acl, "Note");

        if self.config.audit.enabled {
            let sink = CollectionAuditSink::new(self.db.collection(&self.config.audit.collection));
            repo.with_audit(Arc::new(sink))
        } else {
            repo
        }
    }

    /// Audit trail loaded into a bounded in-memory log
    pub fn audit_log(&self) -> anyhow::Result<AuditLog> {
        let log = AuditLog::new(self.config.audit.max_entries);
        let documents = self
            .db
            .collection(&self.config.audit.collection)
            .find_many(&Filter::new())?;
        for document in documents {
            let record: AuditRecord = from_document(document)?;
            log.log(record)?;
        }
        Ok(log)
    }

    /// Persist the snapshot
    pub fn save(&self) -> anyhow::Result<()> {
        self.db.save_to_file(&self.config.data_file)?;
        Ok(())
    }
}
