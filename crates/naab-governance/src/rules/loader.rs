//! Discovery and loading of `govern.json`.
//!
//! Loading is a pipeline over the raw JSON document: parse, lint unknown
//! keys, resolve `extends` (child wins), substitute environment variables,
//! then deserialize into a [`RuleSet`]. Custom rules with invalid regexes
//! are disabled with a warning rather than failing the load.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::env::substitute_env;
use super::merge::merge_documents;
use super::model::RuleSet;
use super::schema::lint_document;
use crate::error::{ConfigWarning, GovernanceError, Result};
use crate::obs;

/// File name searched for during discovery.
pub const POLICY_FILE_NAME: &str = "govern.json";

/// A policy that loaded successfully, with the warnings raised on the way.
#[derive(Debug, Clone)]
pub struct LoadedPolicy {
    pub rules: RuleSet,
    pub source: PathBuf,
    pub warnings: Vec<ConfigWarning>,
}

impl LoadedPolicy {
    /// Directory relative paths in the policy resolve against.
    pub fn base_dir(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Reads policies from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleStore;

impl RuleStore {
    /// Walk from `start` up to the filesystem root looking for `govern.json`.
    /// `start` may be a file or a directory.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
        let start = if start.is_file() {
            start.parent()?
        } else {
            start.as_path()
        };
        start
            .ancestors()
            .map(|dir| dir.join(POLICY_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Discover and load. `Ok(None)` when no policy exists, in which case
    /// governance is inactive.
    pub fn discover_and_load(start: &Path) -> Result<Option<LoadedPolicy>> {
        match Self::discover(start) {
            Some(path) => Self::load(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Load the policy at `path`.
    pub fn load(path: &Path) -> Result<LoadedPolicy> {
        let doc = read_document(path)?;
        let mut warnings = Vec::new();

        let schema = doc
            .pointer("/meta/schema_validation")
            .cloned()
            .unwrap_or(Value::Null);
        if flag(&schema, "warn_unknown_keys", true) {
            warnings.extend(lint_document(
                &doc,
                flag(&schema, "suggest_corrections", true),
            ));
        }

        let max_depth = doc
            .pointer("/meta/inheritance/max_depth")
            .and_then(Value::as_u64)
            .map(|d| d as usize)
            .unwrap_or(5);
        if let Some(strategy) = doc
            .pointer("/meta/inheritance/merge_strategy")
            .and_then(Value::as_str)
            .filter(|s| *s != "child_wins")
        {
            warnings.push(ConfigWarning::UnsupportedMergeStrategy {
                strategy: strategy.to_string(),
            });
        }

        let mut visited = HashSet::new();
        visited.insert(canonical(path));
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut merged = resolve_extends(doc, base_dir, 0, max_depth, &mut visited, &mut warnings)?;

        let env = merged.pointer("/meta/environment").cloned().unwrap_or(Value::Null);
        if flag(&env, "allow_env_var_substitution", false) {
            let prefix = env
                .get("env_prefix")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            merged = substitute_env(&merged, &prefix);
        }

        let mut rules: RuleSet =
            serde_json::from_value(merged).map_err(|e| GovernanceError::InvalidType {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        disable_invalid_custom_rules(&mut rules, &mut warnings);

        for warning in &warnings {
            obs::emit_policy_warning(path, warning);
        }
        obs::emit_policy_loaded(path, rules.mode, warnings.len());

        Ok(LoadedPolicy {
            rules,
            source: path.to_path_buf(),
            warnings,
        })
    }
}

fn read_document(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|source| GovernanceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: Value = serde_json::from_str(&text).map_err(|e| GovernanceError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if !doc.is_object() {
        return Err(GovernanceError::NotAnObject {
            path: path.to_path_buf(),
        });
    }
    Ok(doc)
}

/// Replace `extends` with the merged parent chain. Missing parents, cycles
/// and the depth limit all degrade to warnings.
fn resolve_extends(
    mut doc: Value,
    base_dir: &Path,
    depth: usize,
    max_depth: usize,
    visited: &mut HashSet<PathBuf>,
    warnings: &mut Vec<ConfigWarning>,
) -> Result<Value> {
    let parent_ref = doc
        .as_object_mut()
        .and_then(|map| map.remove("extends"))
        .and_then(|v| v.as_str().map(str::to_string));
    let Some(parent_ref) = parent_ref else {
        return Ok(doc);
    };

    if depth >= max_depth {
        warnings.push(ConfigWarning::InheritanceDepthReached { max_depth });
        return Ok(doc);
    }

    let parent_path = base_dir.join(&parent_ref);
    if !parent_path.is_file() {
        warnings.push(ConfigWarning::MissingParent { path: parent_path });
        return Ok(doc);
    }
    if !visited.insert(canonical(&parent_path)) {
        warnings.push(ConfigWarning::CircularExtends { path: parent_path });
        return Ok(doc);
    }

    let parent_doc = read_document(&parent_path)?;
    let parent_dir = parent_path.parent().unwrap_or_else(|| Path::new("."));
    let parent = resolve_extends(parent_doc, parent_dir, depth + 1, max_depth, visited, warnings)?;
    Ok(merge_documents(&parent, &doc))
}

fn disable_invalid_custom_rules(rules: &mut RuleSet, warnings: &mut Vec<ConfigWarning>) {
    for rule in rules.custom_rules.iter_mut().filter(|r| r.enabled) {
        if let Err(e) = rule.compile() {
            warnings.push(ConfigWarning::InvalidCustomRule {
                id: rule.id.clone(),
                pattern: rule.pattern.clone(),
                reason: e.to_string(),
            });
            rule.enabled = false;
        }
    }
}

fn flag(section: &Value, key: &str, default: bool) -> bool {
    section.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{EnforcementLevel, GovernanceMode};
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_discover_walks_upward() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        let policy = write(tmp.path(), POLICY_FILE_NAME, "{}");

        let found = RuleStore::discover(&nested).unwrap();
        assert_eq!(found.canonicalize().unwrap(), policy.canonicalize().unwrap());
    }

    #[test]
    fn test_discover_from_file_path() {
        let tmp = tempfile::tempdir().unwrap();
        let script = write(tmp.path(), "main.naab", "main {}");
        write(tmp.path(), POLICY_FILE_NAME, "{}");
        assert!(RuleStore::discover(&script).is_some());
    }

    #[test]
    fn test_load_simple_policy() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            POLICY_FILE_NAME,
            r#"{ "mode": "audit", "code_quality": { "no_secrets": "soft" } }"#,
        );
        let loaded = RuleStore::load(&path).unwrap();
        assert_eq!(loaded.rules.mode, GovernanceMode::Audit);
        assert_eq!(
            loaded.rules.code_quality.no_secrets.level,
            Some(EnforcementLevel::Soft)
        );
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.base_dir(), tmp.path());
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), POLICY_FILE_NAME, r#"{ "mode": "audit", }"#);
        let err = RuleStore::load(&path).unwrap_err();
        assert!(matches!(err, GovernanceError::Parse { .. }));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_type_error_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            POLICY_FILE_NAME,
            r#"{ "languages": { "allowed": "python" } }"#,
        );
        let err = RuleStore::load(&path).unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidType { .. }));
    }

    #[test]
    fn test_top_level_must_be_object() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), POLICY_FILE_NAME, "[1, 2]");
        assert!(matches!(
            RuleStore::load(&path).unwrap_err(),
            GovernanceError::NotAnObject { .. }
        ));
    }

    #[test]
    fn test_unknown_key_warns_but_loads() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), POLICY_FILE_NAME, r#"{ "captabilities": {} }"#);
        let loaded = RuleStore::load(&path).unwrap();
        assert_eq!(
            loaded.warnings,
            vec![ConfigWarning::UnknownKey {
                key: "captabilities".into(),
                suggestion: Some("capabilities".into()),
            }]
        );
    }

    #[test]
    fn test_extends_child_wins() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "base.json",
            r#"{ "mode": "audit", "code_quality": { "no_secrets": "hard", "no_pii": true } }"#,
        );
        let path = write(
            tmp.path(),
            POLICY_FILE_NAME,
            r#"{ "extends": "base.json", "mode": "enforce", "code_quality": { "no_pii": false } }"#,
        );
        let loaded = RuleStore::load(&path).unwrap();
        assert_eq!(loaded.rules.mode, GovernanceMode::Enforce);
        assert!(loaded.rules.code_quality.no_secrets.enabled);
        assert!(!loaded.rules.code_quality.no_pii.enabled);
        assert!(loaded.rules.extends.is_none());
    }

    #[test]
    fn test_missing_parent_warns() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            POLICY_FILE_NAME,
            r#"{ "extends": "nope.json", "mode": "off" }"#,
        );
        let loaded = RuleStore::load(&path).unwrap();
        assert_eq!(loaded.rules.mode, GovernanceMode::Off);
        assert!(matches!(loaded.warnings[0], ConfigWarning::MissingParent { .. }));
    }

    #[test]
    fn test_circular_extends_terminates() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.json", r#"{ "extends": "govern.json", "version": "a" }"#);
        let path = write(
            tmp.path(),
            POLICY_FILE_NAME,
            r#"{ "extends": "a.json", "mode": "audit" }"#,
        );
        let loaded = RuleStore::load(&path).unwrap();
        assert_eq!(loaded.rules.version, "a");
        assert!(loaded
            .warnings
            .iter()
            .any(|w| matches!(w, ConfigWarning::CircularExtends { .. })));
    }

    #[test]
    fn test_inheritance_depth_limit() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "c.json", r#"{ "description": "grandparent" }"#);
        write(tmp.path(), "b.json", r#"{ "extends": "c.json", "version": "b" }"#);
        let path = write(
            tmp.path(),
            POLICY_FILE_NAME,
            r#"{ "extends": "b.json", "meta": { "inheritance": { "max_depth": 1 } } }"#,
        );
        let loaded = RuleStore::load(&path).unwrap();
        assert_eq!(loaded.rules.version, "b");
        assert_eq!(loaded.rules.description, "");
        assert!(loaded
            .warnings
            .contains(&ConfigWarning::InheritanceDepthReached { max_depth: 1 }));
    }

    #[test]
    fn test_invalid_custom_regex_disabled() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(
            tmp.path(),
            POLICY_FILE_NAME,
            r#"{ "custom_rules": [ { "id": "bad", "pattern": "(unclosed" }, { "id": "ok", "pattern": "x+" } ] }"#,
        );
        let loaded = RuleStore::load(&path).unwrap();
        assert!(!loaded.rules.custom_rules[0].enabled);
        assert!(loaded.rules.custom_rules[1].enabled);
        assert!(matches!(
            &loaded.warnings[0],
            ConfigWarning::InvalidCustomRule { id, .. } if id == "bad"
        ));
    }
}
