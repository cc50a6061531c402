use crate::changes::{ChangeKind, ChangeLog};
use crate::document::Record;
use serde_json::Value;

/// Nested object that is never lifted to the top level.
pub const PRESERVED_NESTED: &str = "version_info";

/// Lift every nested object except [`PRESERVED_NESTED`] into the top level
/// of `record`, repeating until none is left. Nested keys win on conflict.
pub fn flatten_record(record: &mut Record, changes: &mut ChangeLog) -> bool {
    let mut changed = false;
    loop {
        let nested: Vec<String> = record
            .iter()
            .filter(|(key, value)| value.is_object() && key.as_str() != PRESERVED_NESTED)
            .map(|(key, _)| key.clone())
            .collect();

        if nested.is_empty() {
            break;
        }

        changed = true;
        for key in nested {
            if let Some(Value::Object(inner)) = record.shift_remove(&key) {
                for (k, v) in inner {
                    record.insert(k, v);
                }
                changes.record(
                    ChangeKind::NestedFlattened,
                    format!("Flattened fields from nested '{key}' object"),
                );
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn flatten(value: Value) -> (Value, bool) {
        let Value::Object(mut record) = value else {
            panic!("test input must be an object");
        };
        let mut log = ChangeLog::new();
        let changed = flatten_record(&mut record, &mut log);
        (Value::Object(record), changed)
    }

    #[test]
    fn lifts_multiple_levels() {
        let (out, changed) = flatten(json!({
            "primary_key": "r1",
            "dynamic_field": {"metadata": {"campaign": "x"}, "tone": "calm"}
        }));
        assert!(changed);
        assert_eq!(out, json!({"primary_key": "r1", "tone": "calm", "campaign": "x"}));
    }

    #[test]
    fn nested_values_overwrite_top_level() {
        let (out, _) = flatten(json!({"status": "old", "metadata": {"status": "new"}}));
        assert_eq!(out, json!({"status": "new"}));
    }

    #[test]
    fn overwritten_key_keeps_its_position() {
        let (out, _) = flatten(json!({"a": 1, "meta": {"a": 2, "b": 3}, "c": 4}));
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "c", "b"]);
        assert_eq!(out["a"], json!(2));
    }

    #[test]
    fn version_info_is_preserved() {
        let input = json!({"version_info": {"version": "v2"}, "text": "t"});
        let (out, changed) = flatten(input.clone());
        assert!(!changed);
        assert_eq!(out, input);
    }

    #[test]
    fn empty_nested_object_is_removed() {
        let (out, changed) = flatten(json!({"metadata": {}, "text": "t"}));
        assert!(changed);
        assert_eq!(out, json!({"text": "t"}));
    }

    #[test]
    fn arrays_of_objects_are_not_flattened() {
        let input = json!({"items": [{"a": 1}]});
        let (out, changed) = flatten(input.clone());
        assert!(!changed);
        assert_eq!(out, input);
    }
}
