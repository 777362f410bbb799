//! Deep merge of raw policy documents for `extends` inheritance.

use serde_json::{Map, Value};

/// Merge `child` over `parent`.
///
/// Objects merge key by key, recursively. Any other child value (arrays and
/// scalars included) replaces the parent value outright. Neither input is
/// modified.
pub fn merge_documents(parent: &Value, child: &Value) -> Value {
    match (parent, child) {
        (Value::Object(p), Value::Object(c)) => Value::Object(merge_maps(p, c)),
        (_, child) => child.clone(),
    }
}

fn merge_maps(parent: &Map<String, Value>, child: &Map<String, Value>) -> Map<String, Value> {
    let mut out = parent.clone();
    for (key, child_value) in child {
        let merged = match out.get(key) {
            Some(parent_value) => merge_documents(parent_value, child_value),
            None => child_value.clone(),
        };
        out.insert(key.clone(), merged);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_child_scalar_wins() {
        let parent = json!({ "mode": "enforce", "version": "3.0" });
        let child = json!({ "mode": "audit" });
        assert_eq!(
            merge_documents(&parent, &child),
            json!({ "mode": "audit", "version": "3.0" })
        );
    }

    #[test]
    fn test_nested_objects_merge() {
        let parent = json!({ "code_quality": { "no_secrets": "hard", "no_pii": true } });
        let child = json!({ "code_quality": { "no_pii": false } });
        assert_eq!(
            merge_documents(&parent, &child),
            json!({ "code_quality": { "no_secrets": "hard", "no_pii": false } })
        );
    }

    #[test]
    fn test_arrays_replace() {
        let parent = json!({ "languages": { "allowed": ["python", "rust"] } });
        let child = json!({ "languages": { "allowed": ["go"] } });
        assert_eq!(
            merge_documents(&parent, &child),
            json!({ "languages": { "allowed": ["go"] } })
        );
    }

    #[test]
    fn test_inputs_untouched() {
        let parent = json!({ "a": { "b": 1 } });
        let child = json!({ "a": { "c": 2 } });
        let _ = merge_documents(&parent, &child);
        assert_eq!(parent, json!({ "a": { "b": 1 } }));
        assert_eq!(child, json!({ "a": { "c": 2 } }));
    }

    #[test]
    fn test_object_replaces_scalar() {
        let parent = json!({ "limits": { "timeout": 30 } });
        let child = json!({ "limits": { "timeout": { "global": 60 } } });
        assert_eq!(
            merge_documents(&parent, &child),
            json!({ "limits": { "timeout": { "global": 60 } } })
        );
    }
}
