//! Unknown-key detection with "did you mean" suggestions.

use serde_json::Value;

use crate::error::ConfigWarning;

/// Top-level keys understood by the rule store.
pub const KNOWN_TOP_LEVEL_KEYS: &[&str] = &[
    "version",
    "mode",
    "extends",
    "description",
    "languages",
    "capabilities",
    "limits",
    "requirements",
    "restrictions",
    "code_quality",
    "custom_rules",
    "scopes",
    "output",
    "audit",
    "meta",
    "hooks",
    "polyglot",
];

/// Suggestions further than this edit distance are not offered.
pub const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Character-wise Levenshtein distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Closest known key within [`MAX_SUGGESTION_DISTANCE`], first one on ties.
pub fn suggest_key(key: &str, known: &[&'static str]) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for &candidate in known {
        let d = levenshtein(key, candidate);
        if d <= MAX_SUGGESTION_DISTANCE && best.map_or(true, |(_, bd)| d < bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(k, _)| k)
}

/// Warn about top-level keys the rule store does not understand.
pub fn lint_document(doc: &Value, suggest: bool) -> Vec<ConfigWarning> {
    let Value::Object(map) = doc else {
        return Vec::new();
    };
    map.keys()
        .filter(|k| !KNOWN_TOP_LEVEL_KEYS.contains(&k.as_str()))
        .map(|k| ConfigWarning::UnknownKey {
            key: k.clone(),
            suggestion: if suggest {
                suggest_key(k, KNOWN_TOP_LEVEL_KEYS).map(str::to_string)
            } else {
                None
            },
        })
        .collect()
}
