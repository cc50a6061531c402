//! Document-level structure: the collection wrapper and its records list.

use crate::changes::{ChangeKind, ChangeLog};
use crate::error::{NormalizeError, Result};
use serde_json::{Map, Value};

/// One entity destined for ingestion.
pub type Record = Map<String, Value>;

/// Ensure `doc` is wrapped as `{<collection_key>: collection_name, <data_key>: [...]}`.
///
/// An object that already carries `collection_key` is returned as-is, even
/// if its records list is missing or malformed. Returns whether it wrapped.
pub fn wrap(
    doc: Value,
    collection_key: &str,
    collection_name: &str,
    data_key: &str,
    changes: &mut ChangeLog,
) -> Result<(Value, bool)> {
    let records = match doc {
        Value::Object(ref obj) if obj.contains_key(collection_key) => return Ok((doc, false)),
        Value::Object(_) => Value::Array(vec![doc]),
        Value::Array(_) => doc,
        other => {
            return Err(NormalizeError::shape(format!(
                "document must be an object or an array, found {}",
                kind_of(&other)
            )));
        }
    };

    let mut wrapped = Map::new();
    wrapped.insert(
        collection_key.to_string(),
        Value::String(collection_name.to_string()),
    );
    wrapped.insert(data_key.to_string(), records);

    changes.record(
        ChangeKind::CollectionNameAdded,
        format!("Added '{collection_key}': {collection_name}"),
    );
    changes.record(
        ChangeKind::DataWrapped,
        format!("Wrapped data under '{data_key}'"),
    );
    Ok((Value::Object(wrapped), true))
}

/// The records list of a wrapped document, as found.
#[derive(Debug)]
pub enum Records<'a> {
    List(&'a mut Vec<Value>),
    Missing,
    Malformed(&'static str),
}

pub fn records_mut<'a>(doc: &'a mut Value, data_key: &str) -> Records<'a> {
    match doc.get_mut(data_key) {
        Some(Value::Array(list)) => Records::List(list),
        Some(other) => Records::Malformed(kind_of(other)),
        None => Records::Missing,
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn wrap_default(doc: Value) -> Result<(Value, bool, ChangeLog)> {
        let mut log = ChangeLog::new();
        let (doc, changed) = wrap(doc, "collectionName", "persona_revrebel", "data", &mut log)?;
        Ok((doc, changed, log))
    }

    #[test]
    fn single_object_is_wrapped_in_a_list() {
        let (doc, changed, log) = wrap_default(json!({"id": "a"})).unwrap();
        assert!(changed);
        assert_eq!(
            doc,
            json!({"collectionName": "persona_revrebel", "data": [{"id": "a"}]})
        );
        assert_eq!(log.count(ChangeKind::DataWrapped), 1);
        assert_eq!(log.count(ChangeKind::CollectionNameAdded), 1);
    }

    #[test]
    fn array_becomes_the_records_list() {
        let (doc, changed, _) = wrap_default(json!([{"id": "a"}, {"id": "b"}])).unwrap();
        assert!(changed);
        assert_eq!(doc["data"], json!([{"id": "a"}, {"id": "b"}]));
    }

    #[test]
    fn already_wrapped_document_is_left_alone() {
        let input = json!({"collectionName": "foo", "data": [{"x": 1}]});
        let (doc, changed, log) = wrap_default(input.clone()).unwrap();
        assert!(!changed);
        assert!(log.is_empty());
        assert_eq!(doc, input);
    }

    #[test]
    fn identifier_alone_gates_wrapping() {
        let input = json!({"collectionName": "foo", "data": "not a list"});
        let (mut doc, changed, _) = wrap_default(input).unwrap();
        assert!(!changed);
        assert!(matches!(records_mut(&mut doc, "data"), Records::Malformed("a string")));
        assert!(matches!(records_mut(&mut doc, "items"), Records::Missing));
    }

    #[test]
    fn scalar_document_is_rejected() {
        assert!(matches!(
            wrap_default(json!(42)),
            Err(NormalizeError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn custom_data_key_is_used() {
        let mut log = ChangeLog::new();
        let (doc, _) = wrap(json!({"a": 1}), "collectionName", "c", "records", &mut log).unwrap();
        assert_eq!(doc, json!({"collectionName": "c", "records": [{"a": 1}]}));
    }

    #[test]
    fn custom_collection_key_gates_and_is_inserted() {
        let mut log = ChangeLog::new();
        let input = json!({"coll": "x", "data": [{"id": "a"}]});
        let (doc, changed) = wrap(input.clone(), "coll", "c", "data", &mut log).unwrap();
        assert!(!changed);
        assert_eq!(doc, input);

        // the default key no longer gates once another one is configured
        let (doc, changed) = wrap(
            json!({"collectionName": "x", "id": "a"}),
            "coll",
            "c",
            "data",
            &mut log,
        )
        .unwrap();
        assert!(changed);
        assert_eq!(
            doc,
            json!({"coll": "c", "data": [{"collectionName": "x", "id": "a"}]})
        );
        assert_eq!(log.events()[0].detail, "Added 'coll': c");
    }
}
