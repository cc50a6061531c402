//! Field normalization rules.
//!
//! Each [`Rule`] is a declarative descriptor: a presence/shape test on one or
//! more record fields plus the repair applied when the test fails. Rules are
//! idempotent and independent; [`RuleSet`] fixes the order they run in.
//!
//! The order matters in two places. `id` must be renamed before relocation
//! runs, otherwise it would be moved into `metadata`. Relocation runs last
//! because it relies on every reserved key already having its final name.

use crate::changes::{ChangeKind, ChangeLog};
use crate::config::Defaults;
use crate::document::{Record, kind_of};
use crate::error::{NormalizeError, Result};
use crate::flatten::PRESERVED_NESTED;
use serde_json::{Map, Value};

/// Top-level fields that belong to the ingestion schema.
pub const RESERVED_FIELDS: &[&str] = &[
    "primary_key",
    "vector",
    "text",
    "persona_id",
    "persona_version",
    "module",
    "submodule",
    "status",
    "tone",
    "platform",
    "channel",
    "severity",
    "author",
    "language",
    "created_ym",
    "confidence_score",
    "weight",
    "use_case",
    "audience",
    "version_info",
    "_source_file",
];

/// Catch-all object for fields outside [`RESERVED_FIELDS`].
pub const METADATA_KEY: &str = "metadata";

/// Fields stored as lists of strings.
pub const LIST_FIELDS: &[&str] = &["tone", "platform", "channel", "audience"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefault {
    pub field: &'static str,
    pub value: String,
    pub kind: ChangeKind,
}

impl FieldDefault {
    fn new(field: &'static str, value: &str, kind: ChangeKind) -> Self {
        Self {
            field,
            value: value.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Move `from` to `to` when `to` is absent.
    Rename {
        from: &'static str,
        to: &'static str,
        kind: ChangeKind,
    },
    /// Insert a scalar default when the field is absent.
    Default(FieldDefault),
    /// Ensure `parent` is an object holding every listed sub-field.
    /// Existing sub-fields are never overwritten.
    NestedDefaults {
        parent: &'static str,
        created: ChangeKind,
        fields: Vec<FieldDefault>,
    },
    /// Split a comma-separated string into a trimmed list.
    SplitList { field: &'static str },
    /// Replace a string value equal to `matches` (ignoring case).
    Rewrite {
        field: &'static str,
        matches: &'static str,
        replacement: &'static str,
        kind: ChangeKind,
    },
    /// Move every key outside `allowed` into the `into` object.
    Relocate {
        into: &'static str,
        allowed: &'static [&'static str],
    },
}

impl Rule {
    /// Apply the rule to `record`, returning whether it changed anything.
    pub fn apply(&self, record: &mut Record, changes: &mut ChangeLog) -> Result<bool> {
        match self {
            Rule::Rename { from, to, kind } => {
                if record.contains_key(*to) {
                    return Ok(false);
                }
                let Some(value) = record.shift_remove(*from) else {
                    return Ok(false);
                };
                record.insert(to.to_string(), value);
                changes.record(*kind, format!("Renamed '{from}' to '{to}'"));
                Ok(true)
            }
            Rule::Default(default) => Ok(insert_missing(record, default, changes, None)),
            Rule::NestedDefaults {
                parent,
                created,
                fields,
            } => {
                let mut changed = false;
                if !record.contains_key(*parent) {
                    changes.record(*created, format!("Created '{parent}' object"));
                    changed = true;
                }
                match record
                    .entry(parent.to_string())
                    .or_insert_with(|| Value::Object(Map::new()))
                {
                    Value::Object(nested) => {
                        for default in fields {
                            changed |= insert_missing(nested, default, changes, Some(*parent));
                        }
                        Ok(changed)
                    }
                    other => Err(NormalizeError::shape(format!(
                        "'{parent}' must be an object, found {}",
                        kind_of(other)
                    ))),
                }
            }
            Rule::SplitList { field } => {
                let Some(Value::String(raw)) = record.get(*field) else {
                    return Ok(false);
                };
                let items: Vec<Value> = raw
                    .split(',')
                    .map(|item| Value::String(item.trim().to_string()))
                    .collect();
                record.insert(field.to_string(), Value::Array(items));
                changes.record(
                    ChangeKind::ArraysFixed,
                    format!("Fixed '{field}': converted string to array"),
                );
                Ok(true)
            }
            Rule::Rewrite {
                field,
                matches,
                replacement,
                kind,
            } => {
                let Some(Value::String(current)) = record.get(*field) else {
                    return Ok(false);
                };
                if current.to_lowercase() != *matches {
                    return Ok(false);
                }
                let detail = format!("Fixed '{field}': changed '{current}' to '{replacement}'");
                record.insert(field.to_string(), Value::String(replacement.to_string()));
                changes.record(*kind, detail);
                Ok(true)
            }
            Rule::Relocate { into, allowed } => relocate(record, into, allowed, changes),
        }
    }
}

fn insert_missing(
    target: &mut Map<String, Value>,
    default: &FieldDefault,
    changes: &mut ChangeLog,
    parent: Option<&str>,
) -> bool {
    if target.contains_key(default.field) {
        return false;
    }
    target.insert(
        default.field.to_string(),
        Value::String(default.value.clone()),
    );
    let path = match parent {
        Some(parent) => format!("{parent}.{}", default.field),
        None => default.field.to_string(),
    };
    changes.record(default.kind, format!("Added {path}: {}", default.value));
    true
}

fn relocate(
    record: &mut Record,
    into: &str,
    allowed: &[&str],
    changes: &mut ChangeLog,
) -> Result<bool> {
    let strays: Vec<String> = record
        .keys()
        .filter(|key| key.as_str() != into && !allowed.contains(&key.as_str()))
        .cloned()
        .collect();

    let existing = match record.get(into) {
        Some(Value::Object(existing)) => Some(existing),
        Some(other) if !strays.is_empty() => {
            return Err(NormalizeError::shape(format!(
                "'{into}' must be an object, found {}",
                kind_of(other)
            )));
        }
        _ => None,
    };

    // A same-named key already in the catch-all wins; the stray stays put.
    let movable: Vec<String> = strays
        .into_iter()
        .filter(|key| existing.is_none_or(|m| !m.contains_key(key)))
        .collect();

    let mut moved = Vec::with_capacity(movable.len());
    for key in movable {
        if let Some(value) = record.shift_remove(&key) {
            moved.push((key, value));
        }
    }

    let changed = !moved.is_empty();
    if changed {
        let target = record
            .entry(into.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(target) = target {
            for (key, value) in moved {
                changes.record(
                    ChangeKind::FieldsMovedToMetadata,
                    format!("Moved '{key}' to {into} object"),
                );
                target.insert(key, value);
            }
        }
    }

    // an empty catch-all is dropped, but only moves count as a change
    if matches!(record.get(into), Some(Value::Object(m)) if m.is_empty()) {
        record.shift_remove(into);
    }
    Ok(changed)
}

/// Ordered list of rules run on every record after flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn from_defaults(defaults: &Defaults) -> Self {
        let mut rules = vec![
            Rule::Rename {
                from: "id",
                to: "primary_key",
                kind: ChangeKind::IdToPrimaryKey,
            },
            Rule::Default(FieldDefault::new(
                "persona_id",
                &defaults.persona_id,
                ChangeKind::PersonaIdAdded,
            )),
            Rule::Default(FieldDefault::new(
                "created_ym",
                &defaults.created_ym,
                ChangeKind::CreatedYmAdded,
            )),
            Rule::Default(FieldDefault::new(
                "status",
                &defaults.status,
                ChangeKind::StatusAdded,
            )),
            Rule::Default(FieldDefault::new(
                "author",
                &defaults.author,
                ChangeKind::AuthorAdded,
            )),
            Rule::NestedDefaults {
                parent: PRESERVED_NESTED,
                created: ChangeKind::VersionInfoCreated,
                fields: vec![
                    FieldDefault::new("version", &defaults.version, ChangeKind::VersionAdded),
                    FieldDefault::new(
                        "created_date",
                        &defaults.created_date,
                        ChangeKind::CreatedDateAdded,
                    ),
                    FieldDefault::new(
                        "last_updated",
                        &defaults.last_updated,
                        ChangeKind::LastUpdatedAdded,
                    ),
                    FieldDefault::new(
                        "status",
                        &defaults.version_status,
                        ChangeKind::VersionStatusAdded,
                    ),
                    FieldDefault::new(
                        "approved_by",
                        &defaults.approved_by,
                        ChangeKind::ApprovedByAdded,
                    ),
                ],
            },
        ];
        rules.extend(LIST_FIELDS.iter().map(|&field| Rule::SplitList { field }));
        rules.push(Rule::Rewrite {
            field: "language",
            matches: "english",
            replacement: "en",
            kind: ChangeKind::LanguageFixed,
        });
        rules.push(Rule::Relocate {
            into: METADATA_KEY,
            allowed: RESERVED_FIELDS,
        });
        Self::new(rules)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run every rule in order. All rules run even after one reports a change.
    pub fn apply(&self, record: &mut Record, changes: &mut ChangeLog) -> Result<bool> {
        let mut changed = false;
        for rule in &self.rules {
            changed |= rule.apply(record, changes)?;
        }
        Ok(changed)
    }
}
