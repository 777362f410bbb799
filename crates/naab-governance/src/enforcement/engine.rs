//! The enforcement decision engine.
//!
//! [`EnforcementEngine::enforce`] turns a failed check into a decision from
//! the governance mode, the rule's level and the session override flag.
//! Every call is recorded, whether or not it blocks.
//!
//! | mode    | level    | override | outcome                          |
//! |---------|----------|----------|----------------------------------|
//! | off     | any      | any      | not blocked, not audited         |
//! | audit   | any      | any      | not blocked, audited             |
//! | enforce | hard     | any      | blocked                          |
//! | enforce | soft     | no       | blocked                          |
//! | enforce | soft     | yes      | not blocked, override audited    |
//! | enforce | advisory | any      | not blocked, warning logged      |

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::{record_best_effort, AuditEvent, AuditMetadata, AuditSink};
use crate::hooks::{HookEvent, HookRunner, HookVars};
use crate::obs;
use crate::rules::{AuditConfig, AuditLevel, EnforcementLevel, GovernanceMode};

/// What happened to one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Blocked,
    Warned,
    Overridden,
    AuditOnly,
    Disabled,
}

impl Outcome {
    pub fn is_blocking(self) -> bool {
        self == Outcome::Blocked
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Blocked => "blocked",
            Outcome::Warned => "warned",
            Outcome::Overridden => "overridden",
            Outcome::AuditOnly => "audit_only",
            Outcome::Disabled => "disabled",
        }
    }
}

/// Recorded result of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub rule: String,
    pub level: EnforcementLevel,
    pub passed: bool,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Which events reach the audit sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFilter {
    pub level: AuditLevel,
    pub passes: bool,
    pub failures: bool,
    pub overrides: bool,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self::from(&AuditConfig::default())
    }
}

impl From<&AuditConfig> for AuditFilter {
    fn from(cfg: &AuditConfig) -> Self {
        Self {
            level: cfg.level,
            passes: cfg.log_events.checks_passed,
            failures: cfg.log_events.checks_failed,
            overrides: cfg.log_events.overrides,
        }
    }
}

impl AuditFilter {
    fn allows(&self, event: AuditEvent) -> bool {
        match (self.level, event) {
            (AuditLevel::None, _) => false,
            (AuditLevel::Basic, AuditEvent::CheckPassed) => false,
            (_, AuditEvent::CheckPassed) => self.passes,
            (_, AuditEvent::Override) => self.overrides,
            _ => self.failures,
        }
    }
}

pub struct EnforcementEngine {
    mode: GovernanceMode,
    override_enabled: AtomicBool,
    results: Mutex<Vec<CheckResult>>,
    audit: Option<Arc<dyn AuditSink>>,
    audit_filter: AuditFilter,
    hooks: HookRunner,
    echo_stderr: bool,
    session: Uuid,
}

impl std::fmt::Debug for EnforcementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnforcementEngine")
            .field("mode", &self.mode)
            .field("session", &self.session)
            .field("override_enabled", &self.override_enabled())
            .field("has_audit", &self.audit.is_some())
            .finish()
    }
}

impl EnforcementEngine {
    pub fn new(mode: GovernanceMode) -> Self {
        Self {
            mode,
            override_enabled: AtomicBool::new(false),
            results: Mutex::new(Vec::new()),
            audit: None,
            audit_filter: AuditFilter::default(),
            hooks: HookRunner::default(),
            echo_stderr: true,
            session: Uuid::new_v4(),
        }
    }

    /// Tag audit records with an existing session id instead of a fresh one.
    pub fn with_session(mut self, session: Uuid) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>, filter: AuditFilter) -> Self {
        self.audit = Some(sink);
        self.audit_filter = filter;
        self
    }

    pub fn with_hooks(mut self, hooks: HookRunner) -> Self {
        self.hooks = hooks;
        self
    }

    /// Disable the `[governance] ...` stderr lines (the CLI prints its own).
    pub fn quiet(mut self) -> Self {
        self.echo_stderr = false;
        self
    }

    pub fn mode(&self) -> GovernanceMode {
        self.mode
    }

    pub fn set_override(&self, enabled: bool) {
        self.override_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn override_enabled(&self) -> bool {
        self.override_enabled.load(Ordering::SeqCst)
    }

    pub fn hooks(&self) -> &HookRunner {
        &self.hooks
    }

    /// Decide on a failed check. Returns the blocking message, or `None`
    /// when execution may continue.
    pub fn enforce(&self, rule: &str, level: EnforcementLevel, message: &str) -> Option<String> {
        let outcome = self.decide(level);
        obs::emit_check_violation(rule, level, outcome.as_str());

        self.record(CheckResult {
            rule: rule.to_string(),
            level,
            passed: false,
            outcome,
            message: Some(message.to_string()),
            metadata: BTreeMap::new(),
        });

        match outcome {
            Outcome::Disabled => {}
            Outcome::AuditOnly => {
                self.echo(&format!("AUDIT {rule}: {}", first_line(message)));
                self.audit(AuditEvent::CheckFailed, rule, level, message);
            }
            Outcome::Warned => {
                self.echo(&format!("WARNING {rule}"));
                self.audit(AuditEvent::CheckWarned, rule, level, message);
            }
            Outcome::Overridden => {
                obs::emit_check_override(rule);
                self.echo(&format!("OVERRIDE {rule}"));
                self.audit(AuditEvent::Override, rule, level, message);
                self.hooks.fire(HookEvent::Override, &hook_vars(rule, level, message));
            }
            Outcome::Blocked => {
                self.audit(AuditEvent::CheckFailed, rule, level, message);
                self.hooks.fire(HookEvent::Violation, &hook_vars(rule, level, message));
            }
            Outcome::Passed => {}
        }

        outcome.is_blocking().then(|| message.to_string())
    }

    fn decide(&self, level: EnforcementLevel) -> Outcome {
        match (self.mode, level) {
            (GovernanceMode::Off, _) => Outcome::Disabled,
            (GovernanceMode::Audit, _) => Outcome::AuditOnly,
            (GovernanceMode::Enforce, EnforcementLevel::Hard) => Outcome::Blocked,
            (GovernanceMode::Enforce, EnforcementLevel::Soft) if self.override_enabled() => {
                Outcome::Overridden
            }
            (GovernanceMode::Enforce, EnforcementLevel::Soft) => Outcome::Blocked,
            (GovernanceMode::Enforce, EnforcementLevel::Advisory) => Outcome::Warned,
        }
    }

    pub fn record_pass(&self, rule: &str, level: EnforcementLevel) {
        obs::emit_check_passed(rule, level);
        self.record(CheckResult {
            rule: rule.to_string(),
            level,
            passed: true,
            outcome: Outcome::Passed,
            message: None,
            metadata: BTreeMap::new(),
        });
        if self.mode != GovernanceMode::Off {
            self.audit(AuditEvent::CheckPassed, rule, level, "");
        }
    }

    fn record(&self, result: CheckResult) {
        if let Ok(mut results) = self.results.lock() {
            results.push(result);
        }
    }

    /// Snapshot of every recorded result, in order.
    pub fn results(&self) -> Vec<CheckResult> {
        self.results.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn clear_results(&self) {
        if let Ok(mut results) = self.results.lock() {
            results.clear();
        }
    }

    fn audit(&self, event: AuditEvent, rule: &str, level: EnforcementLevel, message: &str) {
        let Some(sink) = &self.audit else {
            return;
        };
        if !self.audit_filter.allows(event) {
            return;
        }
        let mut metadata = AuditMetadata::new();
        metadata.insert("rule".into(), rule.to_string());
        metadata.insert("level".into(), level.to_string());
        metadata.insert("mode".into(), self.mode.to_string());
        metadata.insert("session".into(), self.session.to_string());
        record_best_effort(sink.as_ref(), event, first_line(message), &metadata);
    }

    fn echo(&self, line: &str) {
        if self.echo_stderr {
            eprintln!("[governance] {line}");
        }
    }
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default()
}

fn hook_vars(rule: &str, level: EnforcementLevel, message: &str) -> HookVars {
    let mut vars = HookVars::new();
    vars.insert("rule", rule.to_string());
    vars.insert("level", level.to_string());
    vars.insert("message", first_line(message).to_string());
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;

    const LEVELS: [EnforcementLevel; 3] = [
        EnforcementLevel::Hard,
        EnforcementLevel::Soft,
        EnforcementLevel::Advisory,
    ];

    fn engine(mode: GovernanceMode) -> (EnforcementEngine, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        let filter = AuditFilter {
            level: AuditLevel::Full,
            ..AuditFilter::default()
        };
        let engine = EnforcementEngine::new(mode)
            .with_audit(sink.clone(), filter)
            .quiet();
        (engine, sink)
    }

    #[test]
    fn test_off_never_blocks() {
        let (engine, sink) = engine(GovernanceMode::Off);
        engine.set_override(false);
        for level in LEVELS {
            assert_eq!(engine.enforce("r", level, "msg"), None);
        }
        assert!(sink.events().is_empty());
        assert!(engine
            .results()
            .iter()
            .all(|r| r.outcome == Outcome::Disabled));
    }

    #[test]
    fn test_audit_mode_records_without_blocking() {
        let (engine, sink) = engine(GovernanceMode::Audit);
        for level in LEVELS {
            assert_eq!(engine.enforce("r", level, "msg\nmore"), None);
        }
        assert_eq!(sink.count(AuditEvent::CheckFailed), 3);
        assert_eq!(sink.events()[0].details, "msg");
    }

    #[test]
    fn test_hard_blocks_regardless_of_override() {
        let (engine, _) = engine(GovernanceMode::Enforce);
        assert_eq!(
            engine.enforce("r", EnforcementLevel::Hard, "blocked").as_deref(),
            Some("blocked")
        );
        engine.set_override(true);
        assert_eq!(
            engine.enforce("r", EnforcementLevel::Hard, "blocked").as_deref(),
            Some("blocked")
        );
    }

    #[test]
    fn test_soft_override() {
        let (engine, sink) = engine(GovernanceMode::Enforce);
        assert!(engine.enforce("r", EnforcementLevel::Soft, "m").is_some());
        assert_eq!(sink.count(AuditEvent::Override), 0);

        engine.set_override(true);
        assert!(engine.enforce("r", EnforcementLevel::Soft, "m").is_none());
        assert_eq!(sink.count(AuditEvent::Override), 1);
    }

    #[test]
    fn test_advisory_warns() {
        let (engine, sink) = engine(GovernanceMode::Enforce);
        assert!(engine.enforce("r", EnforcementLevel::Advisory, "m").is_none());
        assert_eq!(sink.count(AuditEvent::CheckWarned), 1);
    }

    #[test]
    fn test_every_call_recorded() {
        let (engine, _) = engine(GovernanceMode::Enforce);
        engine.record_pass("a", EnforcementLevel::Hard);
        engine.enforce("b", EnforcementLevel::Hard, "m");
        engine.enforce("c", EnforcementLevel::Advisory, "m");
        let results = engine.results();
        assert_eq!(results.len(), 3);
        assert!(results[0].passed);
        assert_eq!(results[1].outcome, Outcome::Blocked);
        assert_eq!(results[2].outcome, Outcome::Warned);

        engine.clear_results();
        assert!(engine.results().is_empty());
    }

    #[test]
    fn test_basic_audit_level_skips_passes() {
        let sink = Arc::new(MemoryAuditSink::new());
        let engine = EnforcementEngine::new(GovernanceMode::Enforce)
            .with_audit(sink.clone(), AuditFilter::default())
            .quiet();
        engine.record_pass("a", EnforcementLevel::Hard);
        engine.enforce("b", EnforcementLevel::Hard, "m");
        assert_eq!(sink.count(AuditEvent::CheckPassed), 0);
        assert_eq!(sink.count(AuditEvent::CheckFailed), 1);
    }

    #[test]
    fn test_audit_level_none_records_nothing() {
        let sink = Arc::new(MemoryAuditSink::new());
        let filter = AuditFilter {
            level: AuditLevel::None,
            ..AuditFilter::default()
        };
        let engine = EnforcementEngine::new(GovernanceMode::Enforce)
            .with_audit(sink.clone(), filter)
            .quiet();
        engine.enforce("b", EnforcementLevel::Hard, "m");
        assert!(sink.events().is_empty());
    }
}
