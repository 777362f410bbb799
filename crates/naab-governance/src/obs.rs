//! Structured tracing events for the governance lifecycle.
//!
//! Every event carries an `event = "..."` field so log pipelines can filter
//! on it. Verbosity is controlled through `RUST_LOG`.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::ConfigWarning;
use crate::rules::{EnforcementLevel, GovernanceMode};

/// RAII guard that scopes tracing output to one polyglot block check.
///
/// ```ignore
/// let _span = BlockSpan::enter("python", "main.naab", 12);
/// ```
pub struct BlockSpan {
    _span: tracing::span::EnteredSpan,
}

impl BlockSpan {
    pub fn enter(language: &str, source_file: &str, line: usize) -> Self {
        let span = tracing::info_span!(
            "governance.block",
            language = %language,
            file = %source_file,
            line = line,
        );
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_policy_loaded(path: &Path, mode: GovernanceMode, warnings: usize) {
    info!(
        event = "policy.loaded",
        path = %path.display(),
        mode = %mode,
        warnings = warnings,
    );
}

pub fn emit_policy_warning(path: &Path, warning: &ConfigWarning) {
    warn!(event = "policy.warning", path = %path.display(), warning = %warning);
}

pub fn emit_check_passed(rule: &str, level: EnforcementLevel) {
    debug!(event = "check.passed", rule = %rule, level = %level);
}

pub fn emit_check_violation(rule: &str, level: EnforcementLevel, outcome: &str) {
    info!(
        event = "check.violation",
        rule = %rule,
        level = %level,
        outcome = %outcome,
    );
}

pub fn emit_check_override(rule: &str) {
    warn!(event = "check.override", rule = %rule);
}

/// Emitted after the catalog ran for one block.
pub fn emit_block_checked(language: &str, evaluated: usize, blocked: bool) {
    info!(
        event = "block.checked",
        language = %language,
        evaluated = evaluated,
        blocked = blocked,
    );
}

pub fn emit_sandbox_violation(operation: &str, resource: &str, reason: &str) {
    warn!(
        event = "sandbox.violation",
        operation = %operation,
        resource = %resource,
        reason = %reason,
    );
}

pub fn emit_ledger_appended(sequence: u64, event_name: &str) {
    debug!(event = "ledger.appended", sequence = sequence, kind = %event_name);
}

pub fn emit_ledger_verified(path: &Path, valid: bool, total: usize, verified: usize) {
    info!(
        event = "ledger.verified",
        path = %path.display(),
        valid = valid,
        total = total,
        verified = verified,
    );
}

/// Audit writes are best-effort; failures surface only here.
pub fn emit_audit_write_failed(error: &dyn std::fmt::Display) {
    warn!(event = "audit.write_failed", error = %error);
}

pub fn emit_hook_fired(hook: &str, command: &str) {
    debug!(event = "hook.fired", hook = %hook, command = %command);
}

pub fn emit_hook_failed(hook: &str, error: &dyn std::fmt::Display) {
    warn!(event = "hook.failed", hook = %hook, error = %error);
}

pub fn emit_report_written(format: &str, path: &Path) {
    info!(event = "report.written", format = %format, path = %path.display());
}
