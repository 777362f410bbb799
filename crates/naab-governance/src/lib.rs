//! NAAb Governance Core
//!
//! Policy enforcement and trust core for polyglot blocks: rule loading,
//! static checks, enforcement decisions, a capability sandbox, a
//! tamper-evident audit ledger and report rendering.

pub mod audit;
pub mod checks;
pub mod enforcement;
pub mod error;
pub mod governance;
pub mod hooks;
pub mod obs;
pub mod rate_limit;
pub mod report;
pub mod rules;
pub mod sandbox;
pub mod telemetry;

pub use audit::{
    verify_ledger, AuditError, AuditEvent, AuditMetadata, AuditResult, AuditSink, EventLog,
    EventRecord, LedgerEntry, MemoryAuditSink, RotationPolicy, TamperEvidentLedger,
    VerificationReport, GENESIS_HASH,
};

pub use checks::runtime::{FsAccess, LimitKind};
pub use checks::{
    catalog, run_catalog, BlockContext, BlockOutcome, CheckCategory, CheckDescriptor, CheckOutcome,
    Violation, CATALOG,
};

pub use enforcement::{
    format_summary, AuditFilter, CheckResult, EnforcementEngine, Outcome, SummaryCounts,
    ViolationNotice,
};

pub use error::{ConfigWarning, GovernanceError, Result};

pub use governance::{open_audit_sink, Governance};

pub use hooks::{HookEvent, HookRunner, HookVars};

pub use rate_limit::{RateKind, RateLimiter};

pub use report::{write_reports, ReportFormat};

pub use rules::{
    EnforcementLevel, GovernanceMode, LoadedPolicy, RuleSet, RuleStore, POLICY_FILE_NAME,
};

pub use sandbox::{
    Capability, PermissionLevel, Sandbox, SandboxConfig, SandboxError, SandboxManager,
    SandboxViolation, ScopedSandbox,
};

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
