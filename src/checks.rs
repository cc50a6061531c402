//! Read-only record checks. These never modify a record and never mark a
//! file as changed.

use crate::document::Record;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// `vector` is absent or empty; embeddings need regenerating.
    EmptyVector { primary_key: String },
    /// No `primary_key` could be derived for the record.
    MissingPrimaryKey { index: usize },
    /// The document is already wrapped but its records list is missing or
    /// not an array, so no record was normalized.
    RecordsUnavailable { data_key: String, found: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::EmptyVector { primary_key } => write!(
                f,
                "empty vector for primary_key {primary_key}; regenerate embeddings manually"
            ),
            Warning::MissingPrimaryKey { index } => {
                write!(f, "record #{index} has no primary_key")
            }
            Warning::RecordsUnavailable { data_key, found } => {
                write!(f, "records key '{data_key}' is {found}; no records normalized")
            }
        }
    }
}

/// Mirrors JSON truthiness: null, false, zero and empty containers are falsy.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn primary_key_label(record: &Record) -> String {
    match record.get("primary_key") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "N/A".to_string(),
    }
}

pub fn check_vector(record: &Record) -> Option<Warning> {
    match record.get("vector") {
        Some(v) if !is_falsy(v) => None,
        _ => Some(Warning::EmptyVector {
            primary_key: primary_key_label(record),
        }),
    }
}

pub fn check_primary_key(record: &Record, index: usize) -> Option<Warning> {
    if record.contains_key("primary_key") {
        None
    } else {
        Some(Warning::MissingPrimaryKey { index })
    }
}

/// Run every check on a normalized record.
pub fn check_record(record: &Record, index: usize) -> Vec<Warning> {
    [check_vector(record), check_primary_key(record, index)]
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn rec(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[rstest]
    #[case::absent(json!({"primary_key": "p"}))]
    #[case::null(json!({"primary_key": "p", "vector": null}))]
    #[case::empty_list(json!({"primary_key": "p", "vector": []}))]
    #[case::empty_string(json!({"primary_key": "p", "vector": ""}))]
    fn empty_vectors_warn(#[case] input: Value) {
        assert_eq!(
            check_vector(&rec(input)),
            Some(Warning::EmptyVector {
                primary_key: "p".to_string()
            })
        );
    }

    #[test]
    fn populated_vector_is_fine() {
        assert_eq!(check_vector(&rec(json!({"vector": [0.1, 0.2]}))), None);
    }

    #[test]
    fn missing_primary_key_is_labelled() {
        let warnings = check_record(&rec(json!({"vector": []})), 3);
        assert_eq!(
            warnings,
            vec![
                Warning::EmptyVector {
                    primary_key: "N/A".to_string()
                },
                Warning::MissingPrimaryKey { index: 3 },
            ]
        );
    }

    #[test]
    fn non_string_primary_key_is_rendered() {
        let w = check_vector(&rec(json!({"primary_key": 7}))).unwrap();
        assert_eq!(w.to_string(), "empty vector for primary_key 7; regenerate embeddings manually");
    }
}
