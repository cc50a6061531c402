//! Orchestration: record pipeline, document pipeline and the directory run.
//!
//! A record goes through flatten, then every rule of the [`RuleSet`] in
//! order, then the read-only checks. A document is rewritten only if the
//! wrapper or some record reported a change.

use crate::changes::ChangeLog;
use crate::checks::{self, Warning};
use crate::config::NormalizerConfig;
use crate::document::{self, Record, Records};
use crate::error::{NormalizeError, Result};
use crate::flatten::flatten_record;
use crate::output;
use crate::rules::RuleSet;
use crate::summary::{FileOutcome, FileReport, RunSummary};
use anyhow::{Context, bail};
use chrono::Utc;
use globset::Glob;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Result of normalizing one parsed document in memory.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub document: Value,
    pub changed: bool,
    pub changes: ChangeLog,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
    rules: RuleSet,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        let rules = RuleSet::from_defaults(&config.defaults);
        Self { config, rules }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize one record in place.
    ///
    /// If the passes cancel each other out (e.g. a `metadata` object lifted by
    /// the flattener and rebuilt by relocation), the record is restored and
    /// reported unchanged.
    pub fn normalize_record(
        &self,
        record: &mut Record,
        index: usize,
        changes: &mut ChangeLog,
        warnings: &mut Vec<Warning>,
    ) -> Result<bool> {
        let before = record.clone();
        let mut scratch = ChangeLog::new();

        let mut changed = flatten_record(record, &mut scratch);
        changed |= self.rules.apply(record, &mut scratch)?;

        if changed && *record == before {
            tracing::debug!(index, "passes cancelled out, record unchanged");
            *record = before;
            changed = false;
        } else {
            for change in scratch.events() {
                tracing::info!(change = %change.kind, "{}", change.detail);
            }
            changes.append(&mut scratch);
        }

        for warning in checks::check_record(record, index) {
            tracing::warn!("{warning}");
            warnings.push(warning);
        }
        Ok(changed)
    }

    /// Wrap `doc` if needed and normalize every record in its list.
    pub fn normalize_document(&self, doc: Value) -> Result<DocumentOutcome> {
        let mut changes = ChangeLog::new();
        let mut warnings = Vec::new();

        let (mut doc, wrapped) = document::wrap(
            doc,
            &self.config.collection_key,
            &self.config.collection_name,
            &self.config.data_key,
            &mut changes,
        )?;
        for change in changes.events() {
            tracing::info!(change = %change.kind, "{}", change.detail);
        }
        let mut changed = wrapped;

        match document::records_mut(&mut doc, &self.config.data_key) {
            Records::List(records) => {
                for (index, value) in records.iter_mut().enumerate() {
                    let record = match value {
                        Value::Object(record) => record,
                        other => {
                            return Err(NormalizeError::shape(format!(
                                "record #{index} must be an object, found {}",
                                document::kind_of(other)
                            )));
                        }
                    };
                    changed |= self.normalize_record(record, index, &mut changes, &mut warnings)?;
                }
            }
            Records::Missing => {
                let warning = Warning::RecordsUnavailable {
                    data_key: self.config.data_key.clone(),
                    found: "missing".to_string(),
                };
                tracing::warn!("{warning}");
                warnings.push(warning);
            }
            Records::Malformed(found) => {
                let warning = Warning::RecordsUnavailable {
                    data_key: self.config.data_key.clone(),
                    found: found.to_string(),
                };
                tracing::warn!("{warning}");
                warnings.push(warning);
            }
        }

        Ok(DocumentOutcome {
            document: doc,
            changed,
            changes,
            warnings,
        })
    }

    /// Normalize one file, rewriting it if anything changed. Errors are
    /// captured in the report, never propagated.
    pub fn process_file(&self, path: &Path) -> FileReport {
        let _span = tracing::info_span!("file", path = %path.display()).entered();
        tracing::info!("validating");

        match self.try_process_file(path) {
            Ok(outcome) => {
                let status = if !outcome.changed {
                    tracing::info!("no changes needed, file already valid");
                    FileOutcome::Unchanged
                } else if self.config.dry_run {
                    tracing::info!(changes = outcome.changes.len(), "would save changes (dry run)");
                    FileOutcome::Modified
                } else {
                    tracing::info!(changes = outcome.changes.len(), "saved changes");
                    FileOutcome::Modified
                };
                FileReport {
                    path: path.to_path_buf(),
                    outcome: status,
                    changes: outcome.changes,
                    warnings: outcome.warnings,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "skipping file");
                FileReport::failed(path.to_path_buf(), e)
            }
        }
    }

    fn try_process_file(&self, path: &Path) -> Result<DocumentOutcome> {
        let raw = std::fs::read(path).map_err(|source| NormalizeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: Value = serde_json::from_slice(&raw).map_err(|source| NormalizeError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let outcome = self.normalize_document(doc)?;
        if outcome.changed && !self.config.dry_run {
            output::write_document(path, &outcome.document)?;
        }
        Ok(outcome)
    }

    /// Files directly inside the target directory whose name matches the
    /// configured pattern, sorted by path.
    pub fn discover_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let dir = &self.config.target_dir;
        if !dir.is_dir() {
            bail!("target directory does not exist: {}", dir.display());
        }
        let matcher = Glob::new(&self.config.pattern)
            .with_context(|| format!("invalid file pattern {:?}", self.config.pattern))?
            .compile_matcher();

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("failed to read directory {}", dir.display()))?
        {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            if matcher.is_match(entry.file_name()) {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Normalize every matching file and fold the reports into a summary.
    pub fn run(&self) -> anyhow::Result<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();

        let files = self.discover_files()?;
        if files.is_empty() {
            tracing::warn!(
                dir = %self.config.target_dir.display(),
                pattern = %self.config.pattern,
                "no matching files found"
            );
        } else {
            tracing::info!("found {} file(s) to validate", files.len());
        }

        let summary = RunSummary::new(
            started_at,
            self.config.target_dir.clone(),
            self.config.dry_run,
        );

        #[cfg(feature = "parallel")]
        let mut summary = {
            // reports flow to a collector thread that owns the summary
            let (tx, rx) = crossbeam::channel::unbounded::<FileReport>();
            let collector = std::thread::spawn(move || {
                let mut summary = summary;
                for report in rx {
                    summary.absorb(report);
                }
                summary
            });
            files.par_iter().for_each_with(tx, |tx, path| {
                let _ = tx.send(self.process_file(path));
            });
            collector
                .join()
                .map_err(|_| anyhow::anyhow!("report collector thread panicked"))?
        };

        #[cfg(not(feature = "parallel"))]
        let mut summary = {
            let mut summary = summary;
            for path in &files {
                summary.absorb(self.process_file(path));
            }
            summary
        };

        summary.finish(start.elapsed());
        Ok(summary)
    }
}
