//! Normalizer configuration.
//!
//! [`NormalizerConfig::default`] carries the built-in defaults. A JSON file
//! loaded with [`NormalizerConfig::from_file`] may override any subset of
//! them; keys it omits keep their default value.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Values injected into records that are missing required fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub persona_id: String,
    pub created_ym: String,
    pub status: String,
    pub author: String,
    pub version: String,
    pub created_date: String,
    pub last_updated: String,
    /// Written to `version_info.status`, distinct from the record-level `status`.
    pub version_status: String,
    pub approved_by: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            persona_id: "revrebel_core".to_string(),
            created_ym: "2025-10".to_string(),
            status: "active".to_string(),
            author: "REVREBEL".to_string(),
            version: "v1.0".to_string(),
            created_date: "2025-10-31".to_string(),
            last_updated: "2025-10-31".to_string(),
            version_status: "approved".to_string(),
            approved_by: "REVREBEL Founder".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub target_dir: PathBuf,
    /// Glob matched against file names directly inside `target_dir`.
    pub pattern: String,
    /// Top-level key whose presence marks a document as already wrapped.
    pub collection_key: String,
    /// Collection identifier used when a document has to be wrapped.
    pub collection_name: String,
    /// Key of the records list inside a wrapped document.
    pub data_key: String,
    /// Report what would change without writing anything.
    pub dry_run: bool,
    pub defaults: Defaults,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            target_dir: PathBuf::from("Complete"),
            pattern: "*.json".to_string(),
            collection_key: "collectionName".to_string(),
            collection_name: "persona_revrebel".to_string(),
            data_key: "data".to_string(),
            dry_run: false,
            defaults: Defaults::default(),
        }
    }
}

impl NormalizerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn with_target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = dir.into();
        self
    }
}
