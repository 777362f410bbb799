//! `${VAR}` and `${VAR:-default}` substitution inside policy strings.

use regex::{Captures, Regex};
use serde_json::Value;

const PLACEHOLDER: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}";

/// Substitute placeholders in every string of `doc` from the process
/// environment. Object keys are left alone.
pub fn substitute_env(doc: &Value, prefix: &str) -> Value {
    substitute_with(doc, prefix, &|name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with an injectable lookup.
pub fn substitute_with(
    doc: &Value,
    prefix: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Value {
    let Ok(re) = Regex::new(PLACEHOLDER) else {
        return doc.clone();
    };
    walk(doc, &re, prefix, lookup)
}

fn walk(
    value: &Value,
    re: &Regex,
    prefix: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Value {
    match value {
        Value::String(s) => Value::String(expand(s, re, prefix, lookup)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| walk(v, re, prefix, lookup))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), walk(v, re, prefix, lookup)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn expand(
    s: &str,
    re: &Regex,
    prefix: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> String {
    re.replace_all(s, |caps: &Captures<'_>| {
        let name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str());
        // Names outside the prefix never read the environment.
        let value = if prefix.is_empty() || name.starts_with(prefix) {
            lookup(name)
        } else {
            None
        };
        match (value, default) {
            (Some(v), _) => v,
            (None, Some(d)) => d.to_string(),
            (None, None) => String::new(),
        }
    })
    .into_owned()
}
