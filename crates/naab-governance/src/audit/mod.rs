//! Audit trail: an append-only event log and a tamper-evident hash chain.
//!
//! Both stores implement [`AuditSink`], which is what the enforcement engine
//! and the sandbox write to.
//!
//! # Modules
//!
//! - [`event_log`] : JSONL event log with size-based rotation
//! - [`ledger`]    : SHA-256 chained ledger with optional HMAC signatures
//! - [`verify`]    : chain verification and its report
//! - [`memory`]    : in-memory sink for hosts and tests
//! - [`error`]     : `AuditError` / `AuditResult`

pub mod error;
pub mod event_log;
pub mod ledger;
pub mod memory;
pub mod verify;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use error::{AuditError, AuditResult};
pub use event_log::{EventLog, EventRecord, RotationPolicy};
pub use ledger::{LedgerEntry, TamperEvidentLedger, GENESIS_HASH};
pub use memory::MemoryAuditSink;
pub use verify::{verify_ledger, VerificationReport};

/// Kinds of audited events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEvent {
    BlockLoad,
    BlockExecute,
    SecurityViolation,
    Timeout,
    InvalidPath,
    InvalidBlockId,
    HashMismatch,
    PermissionDenied,
    CheckPassed,
    CheckFailed,
    CheckWarned,
    Override,
}

impl AuditEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditEvent::BlockLoad => "BLOCK_LOAD",
            AuditEvent::BlockExecute => "BLOCK_EXECUTE",
            AuditEvent::SecurityViolation => "SECURITY_VIOLATION",
            AuditEvent::Timeout => "TIMEOUT",
            AuditEvent::InvalidPath => "INVALID_PATH",
            AuditEvent::InvalidBlockId => "INVALID_BLOCK_ID",
            AuditEvent::HashMismatch => "HASH_MISMATCH",
            AuditEvent::PermissionDenied => "PERMISSION_DENIED",
            AuditEvent::CheckPassed => "CHECK_PASSED",
            AuditEvent::CheckFailed => "CHECK_FAILED",
            AuditEvent::CheckWarned => "CHECK_WARNED",
            AuditEvent::Override => "OVERRIDE",
        }
    }
}

impl std::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata attached to an audit record. Ordered so serialized output and
/// ledger hashes are deterministic.
pub type AuditMetadata = BTreeMap<String, String>;

/// Destination for audit records.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent, details: &str, metadata: &AuditMetadata) -> AuditResult<()>;
}

/// Record and swallow failures. Audit writes must never break enforcement.
pub fn record_best_effort(
    sink: &dyn AuditSink,
    event: AuditEvent,
    details: &str,
    metadata: &AuditMetadata,
) {
    if let Err(e) = sink.record(event, details, metadata) {
        crate::obs::emit_audit_write_failed(&e);
    }
}
