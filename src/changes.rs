//! Change tracking.
//!
//! Every pass reports its modifications as [`Change`] events into a
//! [`ChangeLog`]. A file is rewritten only if its log is non-empty, and the
//! run summary folds the logs of all files into [`ChangeCounts`].
//!
//! Events of a record whose passes cancel out are dropped by the pipeline
//! before they reach the file log.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One kind of modification. Variant order is the order counters are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    IdToPrimaryKey,
    CollectionNameAdded,
    DataWrapped,
    NestedFlattened,
    ArraysFixed,
    LanguageFixed,
    FieldsMovedToMetadata,
    PersonaIdAdded,
    CreatedYmAdded,
    StatusAdded,
    AuthorAdded,
    VersionInfoCreated,
    VersionAdded,
    CreatedDateAdded,
    LastUpdatedAdded,
    VersionStatusAdded,
    ApprovedByAdded,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 17] = [
        ChangeKind::IdToPrimaryKey,
        ChangeKind::CollectionNameAdded,
        ChangeKind::DataWrapped,
        ChangeKind::NestedFlattened,
        ChangeKind::ArraysFixed,
        ChangeKind::LanguageFixed,
        ChangeKind::FieldsMovedToMetadata,
        ChangeKind::PersonaIdAdded,
        ChangeKind::CreatedYmAdded,
        ChangeKind::StatusAdded,
        ChangeKind::AuthorAdded,
        ChangeKind::VersionInfoCreated,
        ChangeKind::VersionAdded,
        ChangeKind::CreatedDateAdded,
        ChangeKind::LastUpdatedAdded,
        ChangeKind::VersionStatusAdded,
        ChangeKind::ApprovedByAdded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::IdToPrimaryKey => "id_to_primary_key",
            ChangeKind::CollectionNameAdded => "collection_name_added",
            ChangeKind::DataWrapped => "data_wrapped",
            ChangeKind::NestedFlattened => "nested_flattened",
            ChangeKind::ArraysFixed => "arrays_fixed",
            ChangeKind::LanguageFixed => "language_fixed",
            ChangeKind::FieldsMovedToMetadata => "fields_moved_to_metadata",
            ChangeKind::PersonaIdAdded => "persona_id_added",
            ChangeKind::CreatedYmAdded => "created_ym_added",
            ChangeKind::StatusAdded => "status_added",
            ChangeKind::AuthorAdded => "author_added",
            ChangeKind::VersionInfoCreated => "version_info_created",
            ChangeKind::VersionAdded => "version_added",
            ChangeKind::CreatedDateAdded => "created_date_added",
            ChangeKind::LastUpdatedAdded => "last_updated_added",
            ChangeKind::VersionStatusAdded => "version_status_added",
            ChangeKind::ApprovedByAdded => "approved_by_added",
        }
    }

    /// Human wording used by the text summary.
    pub fn description(self) -> &'static str {
        match self {
            ChangeKind::IdToPrimaryKey => "Renamed 'id' to 'primary_key'",
            ChangeKind::CollectionNameAdded => "Added collection name",
            ChangeKind::DataWrapped => "Wrapped records under the records key",
            ChangeKind::NestedFlattened => "Flattened nested objects",
            ChangeKind::ArraysFixed => "Converted string fields to arrays",
            ChangeKind::LanguageFixed => "Fixed 'language' field to 'en'",
            ChangeKind::FieldsMovedToMetadata => "Moved non-schema fields to metadata object",
            ChangeKind::PersonaIdAdded => "Added persona_id",
            ChangeKind::CreatedYmAdded => "Added created_ym",
            ChangeKind::StatusAdded => "Added status",
            ChangeKind::AuthorAdded => "Added author",
            ChangeKind::VersionInfoCreated => "Created 'version_info' object",
            ChangeKind::VersionAdded => "Added version",
            ChangeKind::CreatedDateAdded => "Added created_date",
            ChangeKind::LastUpdatedAdded => "Added last_updated",
            ChangeKind::VersionStatusAdded => "Added version_info.status",
            ChangeKind::ApprovedByAdded => "Added approved_by",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single modification made by a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub kind: ChangeKind,
    pub detail: String,
}

/// Ordered change events for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeLog {
    events: Vec<Change>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: ChangeKind, detail: impl Into<String>) {
        self.events.push(Change {
            kind,
            detail: detail.into(),
        });
    }

    pub fn append(&mut self, other: &mut ChangeLog) {
        self.events.append(&mut other.events);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &[Change] {
        &self.events
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.events.iter().filter(|c| c.kind == kind).count()
    }

    pub fn counts(&self) -> ChangeCounts {
        let mut counts = ChangeCounts::default();
        for change in &self.events {
            counts.add(change.kind, 1);
        }
        counts
    }
}

/// Per-kind counters aggregated across files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeCounts(BTreeMap<ChangeKind, usize>);

impl ChangeCounts {
    pub fn add(&mut self, kind: ChangeKind, n: usize) {
        if n > 0 {
            *self.0.entry(kind).or_insert(0) += n;
        }
    }

    pub fn merge(&mut self, other: &ChangeCounts) {
        for (kind, n) in &other.0 {
            self.add(*kind, *n);
        }
    }

    pub fn get(&self, kind: ChangeKind) -> usize {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Non-zero counters in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (ChangeKind, usize)> + '_ {
        self.0.iter().map(|(k, n)| (*k, *n))
    }
}
