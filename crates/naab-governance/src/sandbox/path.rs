//! Path normalization and allow-list containment.

use std::path::{Component, Path, PathBuf};

/// Resolve symlinks where the path exists. For paths that do not exist yet
/// the longest existing ancestor is canonicalized and the rest is joined
/// after `.` and `..` are folded lexically.
pub fn normalize(path: &Path) -> PathBuf {
    if let Ok(real) = path.canonicalize() {
        return real;
    }
    let lexical = lexical_normalize(path);
    let mut existing = lexical.as_path();
    let mut rest = Vec::new();
    while let Some(parent) = existing.parent() {
        if let Some(name) = existing.file_name() {
            rest.push(name.to_os_string());
        }
        existing = parent;
        if let Ok(real) = existing.canonicalize() {
            return rest.iter().rev().fold(real, |acc, part| acc.join(part));
        }
    }
    lexical
}

/// Fold `.` and `..` without touching the filesystem. `..` at the root
/// stays at the root.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !path.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether `path` equals or lies under one of `allowed`. Containment is
/// per component, so `/tmpfoo` is not under `/tmp`.
pub fn is_within(path: &Path, allowed: &[PathBuf]) -> bool {
    let path = normalize(path);
    allowed.iter().any(|root| path.starts_with(normalize(root)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_is_per_component() {
        let allowed = vec![PathBuf::from("/tmp")];
        assert!(is_within(Path::new("/tmp/x"), &allowed));
        assert!(is_within(Path::new("/tmp"), &allowed));
        assert!(!is_within(Path::new("/tmpfoo"), &allowed));
        assert!(!is_within(Path::new("/tmp/../etc/passwd"), &allowed));
    }

    #[test]
    fn test_lexical_normalize() {
        assert_eq!(lexical_normalize(Path::new("/a/./b/../c/")), PathBuf::from("/a/c"));
        assert_eq!(lexical_normalize(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(lexical_normalize(Path::new("../x")), PathBuf::from("../x"));
    }

    #[test]
    fn test_symlink_escape_is_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let inside = dir.path().join("inside");
        std::fs::create_dir(&inside).unwrap();
        let outside = tempfile::tempdir().unwrap();
        #[cfg(unix)]
        {
            let link = inside.join("link");
            std::os::unix::fs::symlink(outside.path(), &link).unwrap();
            assert!(!is_within(&link.join("secret"), &[inside.clone()]));
        }
        assert!(is_within(&inside.join("new-file.txt"), &[inside]));
    }
}
