//! AuditLog - bounded in-memory audit sink

use crate::record::{AuditRecord, AuditTrace};
use crate::sink::{AuditError, AuditSink};
use std::collections::VecDeque;
use std::sync::RwLock;

/// In-memory audit log keeping the most recent `max_entries` records
#[derive(Debug)]
pub struct AuditLog {
    entries: RwLock<VecDeque<AuditRecord>>,
    max_entries: usize,
}

/// Audit statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditStats {
    pub total_entries: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl AuditLog {
    /// Create a new AuditLog
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(max_entries.min(1024))),
            max_entries,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Append a record, evicting the oldest one when full
    pub fn log(&self, record: AuditRecord) -> Result<(), AuditError> {
        let mut entries = self.entries.write().map_err(|_| AuditError::LockPoisoned)?;
        if self.max_entries == 0 {
            return Ok(());
        }
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(record);
        Ok(())
    }

    /// Most recent records first
    pub fn recent(&self, limit: usize) -> Vec<AuditRecord> {
        self.read(|entries| entries.iter().rev().take(limit).cloned().collect())
    }

    /// History of one entity, oldest first
    pub fn for_entity(&self, entity_type: &str, entity_id: &str) -> Vec<AuditRecord> {
        self.read(|entries| {
            entries
                .iter()
                .filter(|r| r.entity_type == entity_type && r.entity_id == entity_id)
                .cloned()
                .collect()
        })
    }

    /// Records made by one user, oldest first
    pub fn by_user(&self, user_id: &str) -> Vec<AuditRecord> {
        self.read(|entries| entries.iter().filter(|r| r.user_id == user_id).cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.read(|entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get statistics
    pub fn stats(&self) -> AuditStats {
        self.read(|entries| {
            let count = |trace: AuditTrace| entries.iter().filter(|r| r.trace == trace).count();
            AuditStats {
                total_entries: entries.len(),
                creates: count(AuditTrace::Create),
                updates: count(AuditTrace::Update),
                deletes: count(AuditTrace::Delete),
            }
        })
    }

    /// Export as JSON, oldest first
    pub fn export_json(&self) -> serde_json::Result<serde_json::Value> {
        self.read(|entries| serde_json::to_value(entries))
    }

    // A poisoned lock still holds consistent data: writers only push/pop.
    fn read<R>(&self, f: impl FnOnce(&VecDeque<AuditRecord>) -> R) -> R {
        match self.entries.read() {
            Ok(entries) => f(&entries),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

impl AuditSink for AuditLog {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.log(record.clone())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(10000)
    }
}
