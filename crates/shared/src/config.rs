//! Configuration types for docrepo processes

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the collection holding audit records
pub const AUDIT_COLLECTION: &str = "AuditTraces";

/// Audit settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    /// Whether repositories record audit traces
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Collection receiving audit records
    #[serde(default = "default_audit_collection")]
    pub collection: String,

    /// Capacity of the in-memory audit log
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_true() -> bool {
    true
}

fn default_audit_collection() -> String {
    AUDIT_COLLECTION.to_string()
}

fn default_max_entries() -> usize {
    10_000
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            collection: default_audit_collection(),
            max_entries: default_max_entries(),
        }
    }
}

/// Store configuration (docrepo.json / docrepo.yaml)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// JSON snapshot file backing the document store
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    #[serde(default)]
    pub audit: AuditConfig,
}

fn default_data_file() -> PathBuf {
    PathBuf::from("docrepo-data.json")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            audit: AuditConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a JSON or YAML file, picked by extension
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        let config = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config)
    }
}

/// Error loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
