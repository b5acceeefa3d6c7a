//! Reshapes trial records for a document store that rejects directly nested arrays.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ExpResult;

/// Records flagged with this key are kept local and never reshaped.
pub const NO_UPLOAD_KEY: &str = "no_upload";

/// Serializes `record` and reshapes it with [`flatten_for_upload`].
pub fn upload_value<T: Serialize>(record: &T) -> ExpResult<Value> {
    Ok(flatten_for_upload(serde_json::to_value(record)?))
}

/// Every array-valued field of an object becomes an index-keyed map, one level deep;
/// object-valued fields are processed recursively. Arrays are not descended into,
/// so `[[a], [b]]` becomes `{"0": [a], "1": [b]}`.
pub fn flatten_for_upload(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            if map.get(NO_UPLOAD_KEY) == Some(&Value::Bool(true)) {
                map.remove(NO_UPLOAD_KEY);
                return Value::Object(map);
            }
            Value::Object(flatten_fields(map))
        }
        other => other,
    }
}

fn flatten_fields(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Array(items) => Value::Object(
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(i, v)| (i.to_string(), v))
                        .collect(),
                ),
                Value::Object(inner) => Value::Object(flatten_fields(inner)),
                other => other,
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arrays_become_index_maps_one_level_deep() {
        let flat = flatten_for_upload(json!({
            "drag_data": [[{"x": 1}], []],
            "meta": {"tags": ["a", "b"], "n": 2},
            "rt": 10.5
        }));
        assert_eq!(
            flat,
            json!({
                "drag_data": {"0": [{"x": 1}], "1": []},
                "meta": {"tags": {"0": "a", "1": "b"}, "n": 2},
                "rt": 10.5
            })
        );
    }

    #[test]
    fn local_only_records_are_left_alone() {
        let flat = flatten_for_upload(json!({"no_upload": true, "list": [1, 2]}));
        assert_eq!(flat, json!({"list": [1, 2]}));
    }

    #[test]
    fn non_objects_pass_through() {
        assert_eq!(flatten_for_upload(json!([1, [2]])), json!([1, [2]]));
    }
}
