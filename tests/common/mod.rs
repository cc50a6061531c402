//! Shared helpers for the normalizer integration harness.

#![allow(dead_code)]

use recnorm::{Normalizer, NormalizerConfig};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Record with every kind of defect the pipeline repairs.
pub const MESSY_RECORD: &str = r#"{
  "id": "rec1",
  "tone": "Formal, Playful",
  "language": "English",
  "campaign_id": "X",
  "dynamic_field": {"platform": "web,  mobile", "metadata": {"owner": "ops"}}
}"#;

/// Document already in canonical form.
pub const CLEAN_DOCUMENT: &str = r#"{
  "collectionName": "persona_revrebel",
  "data": [
    {
      "primary_key": "ok1",
      "vector": [0.1, 0.2],
      "text": "héllo wörld",
      "persona_id": "revrebel_core",
      "created_ym": "2025-10",
      "status": "active",
      "author": "REVREBEL",
      "version_info": {
        "version": "v1.0",
        "created_date": "2025-10-31",
        "last_updated": "2025-10-31",
        "status": "approved",
        "approved_by": "REVREBEL Founder"
      },
      "metadata": {
        "campaign_id": "X"
      }
    }
  ]
}"#;

pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("write fixture");
        path
    }

    pub fn read_raw(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("read file")
    }

    pub fn read_json(&self, name: &str) -> Value {
        serde_json::from_str(&self.read_raw(name)).expect("file holds valid JSON")
    }

    pub fn config(&self) -> NormalizerConfig {
        NormalizerConfig::default().with_target_dir(self.path())
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.config())
    }
}
