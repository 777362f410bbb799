//! Error types for the sandbox module.

/// A denied operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Sandbox violation: {operation} on '{resource}' - {reason}")]
pub struct SandboxViolation {
    pub operation: String,
    pub resource: String,
    pub reason: String,
}

impl SandboxViolation {
    pub fn new(
        operation: impl Into<String>,
        resource: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            resource: resource.into(),
            reason: reason.into(),
        }
    }
}

/// Errors produced by the sandbox layer.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error(transparent)]
    Violation(#[from] SandboxViolation),

    #[error("invalid block id '{0}': use letters, digits, '-', '_' or '.'")]
    InvalidBlockId(String),
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = std::result::Result<T, SandboxError>;
