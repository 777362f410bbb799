use std::path::PathBuf;

/// Errors raised by audit sinks. Recording is best-effort, so callers on the
/// enforcement path log these instead of propagating them.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ledger entry at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("invalid HMAC key")]
    InvalidKey,

    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit state lock poisoned")]
    Poisoned,
}

pub type AuditResult<T> = Result<T, AuditError>;

impl AuditError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        AuditError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
