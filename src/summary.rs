//! Per-file reports and the run summary folded from them.

use crate::changes::{ChangeCounts, ChangeLog};
use crate::checks::Warning;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum FileOutcome {
    /// At least one change applied (written unless running dry).
    Modified,
    Unchanged,
    /// Skipped because of a file-scoped error; the file was not touched.
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
    pub changes: ChangeLog,
    pub warnings: Vec<Warning>,
}

impl FileReport {
    pub fn failed(path: PathBuf, error: impl ToString) -> Self {
        Self {
            path,
            outcome: FileOutcome::Failed(error.to_string()),
            changes: ChangeLog::new(),
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub target_dir: PathBuf,
    pub dry_run: bool,
    pub total_files: usize,
    pub files_modified: usize,
    pub files_unchanged: usize,
    pub files_failed: usize,
    pub warnings: usize,
    pub changes: ChangeCounts,
    pub files: Vec<FileReport>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>, target_dir: PathBuf, dry_run: bool) -> Self {
        Self {
            started_at,
            elapsed_secs: 0.0,
            target_dir,
            dry_run,
            total_files: 0,
            files_modified: 0,
            files_unchanged: 0,
            files_failed: 0,
            warnings: 0,
            changes: ChangeCounts::default(),
            files: Vec::new(),
        }
    }

    pub fn absorb(&mut self, report: FileReport) {
        self.total_files += 1;
        match report.outcome {
            FileOutcome::Modified => self.files_modified += 1,
            FileOutcome::Unchanged => self.files_unchanged += 1,
            FileOutcome::Failed(_) => self.files_failed += 1,
        }
        self.warnings += report.warnings.len();
        self.changes.merge(&report.changes.counts());
        self.files.push(report);
    }

    /// Stamp the elapsed time and order file reports by path.
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed_secs = elapsed.as_secs_f64();
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
    }

    pub fn has_failures(&self) -> bool {
        self.files_failed > 0
    }
}
