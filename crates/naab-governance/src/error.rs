//! Error taxonomy for policy loading, plus the recoverable warnings that
//! accompany a successful load.

use std::fmt;
use std::path::PathBuf;

use crate::audit::AuditError;

/// Fatal governance errors. Config variants render as the multi-line
/// diagnostic shown to the operator.
#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    #[error(
        "Governance config error: failed to parse {}\n\n  JSON error: {message}\n\n  Help:\n  - Check for missing commas, brackets, or quotes\n  - Validate the document with a JSON linter before loading it",
        .path.display()
    )]
    Parse { path: PathBuf, message: String },

    #[error(
        "Governance config error: invalid value type in {}\n\n  JSON error: {message}\n\n  Help:\n  - Check that boolean fields are true/false (not strings)\n  - Check that arrays are [...] not single values\n  - Check that numbers are not quoted\n  - Enforcement levels must be \"hard\", \"soft\" or \"advisory\"",
        .path.display()
    )]
    InvalidType { path: PathBuf, message: String },

    #[error(
        "Governance config error: {} must hold a JSON object at the top level",
        .path.display()
    )]
    NotAnObject { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit error: {0}")]
    Audit(#[from] AuditError),
}

/// Result type for governance operations.
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Non-fatal problems found while loading a policy. The policy still loads;
/// callers decide whether to surface these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    UnknownKey {
        key: String,
        suggestion: Option<String>,
    },
    InvalidCustomRule {
        id: String,
        pattern: String,
        reason: String,
    },
    MissingParent {
        path: PathBuf,
    },
    InheritanceDepthReached {
        max_depth: usize,
    },
    CircularExtends {
        path: PathBuf,
    },
    UnsupportedMergeStrategy {
        strategy: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::UnknownKey {
                key,
                suggestion: Some(s),
            } => write!(f, "Unknown key \"{key}\", did you mean \"{s}\"?"),
            ConfigWarning::UnknownKey {
                key,
                suggestion: None,
            } => write!(f, "Unknown key \"{key}\""),
            ConfigWarning::InvalidCustomRule {
                id,
                pattern,
                reason,
            } => write!(
                f,
                "Invalid regex in custom rule '{id}': {pattern} ({reason}); rule disabled"
            ),
            ConfigWarning::MissingParent { path } => {
                write!(f, "Extended config not found: {}", path.display())
            }
            ConfigWarning::InheritanceDepthReached { max_depth } => {
                write!(f, "Max inheritance depth ({max_depth}) reached")
            }
            ConfigWarning::CircularExtends { path } => {
                write!(f, "Circular extends chain through {}", path.display())
            }
            ConfigWarning::UnsupportedMergeStrategy { strategy } => write!(
                f,
                "Unsupported merge strategy \"{strategy}\", using \"child_wins\""
            ),
        }
    }
}
