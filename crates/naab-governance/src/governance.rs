//! The governance session a host runtime talks to.
//!
//! A [`Governance`] owns one immutable [`RuleSet`], the enforcement engine
//! that accumulates results, the audit sink and the rate limiters. Language
//! executors call [`Governance::check_polyglot_block`] before running a block
//! and surface a `Some(message)` as an execution failure.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::audit::{AuditResult, AuditSink, EventLog, RotationPolicy, TamperEvidentLedger};
use crate::checks::runtime::{self, FsAccess, LimitKind};
use crate::checks::{run_catalog, BlockContext, BlockOutcome, CheckOutcome};
use crate::enforcement::{
    format_summary, AuditFilter, CheckResult, EnforcementEngine, SummaryCounts,
};
use crate::hooks::{HookEvent, HookRunner, HookVars};
use crate::obs::{self, BlockSpan};
use crate::rate_limit::{RateKind, RateLimiter};
use crate::report;
use crate::rules::{AuditLevel, LoadedPolicy, RuleSet};

/// Open the audit destination `rules.audit` asks for. Relative paths resolve
/// against `base_dir`. `None` when auditing is off.
pub fn open_audit_sink(
    rules: &RuleSet,
    base_dir: &Path,
    hmac_key: Option<&[u8]>,
) -> AuditResult<Option<Arc<dyn AuditSink>>> {
    let cfg = &rules.audit;
    if cfg.level == AuditLevel::None {
        return Ok(None);
    }
    let path = base_dir.join(&cfg.output_file);
    let sink: Arc<dyn AuditSink> = if cfg.tamper_evidence.enabled {
        let ledger = TamperEvidentLedger::open(path)?;
        match hmac_key {
            Some(key) => Arc::new(ledger.with_hmac_key(key)),
            None => Arc::new(ledger),
        }
    } else {
        Arc::new(EventLog::open(path, RotationPolicy::from(&cfg.retention))?)
    };
    Ok(Some(sink))
}

struct RateLimiters {
    polyglot: RateLimiter,
    stdlib: RateLimiter,
    file_ops: RateLimiter,
}

impl RateLimiters {
    fn new(rules: &RuleSet) -> Self {
        let rate = &rules.limits.rate;
        Self {
            polyglot: RateLimiter::new(rate.max_polyglot_per_second),
            stdlib: RateLimiter::new(rate.max_stdlib_calls_per_second),
            file_ops: RateLimiter::new(rate.max_file_ops_per_second),
        }
    }

    fn get(&self, kind: RateKind) -> &RateLimiter {
        match kind {
            RateKind::Polyglot => &self.polyglot,
            RateKind::Stdlib => &self.stdlib,
            RateKind::FileOps => &self.file_ops,
        }
    }
}

pub struct Governance {
    rules: RuleSet,
    base_dir: PathBuf,
    engine: EnforcementEngine,
    audit: Option<Arc<dyn AuditSink>>,
    limiters: RateLimiters,
    quiet: bool,
    session: Uuid,
}

impl std::fmt::Debug for Governance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Governance")
            .field("mode", &self.rules.mode)
            .field("session", &self.session)
            .field("base_dir", &self.base_dir)
            .field("engine", &self.engine)
            .finish()
    }
}

impl Governance {
    /// A session over `rules` with no audit sink. Reports resolve against the
    /// current directory.
    pub fn new(rules: RuleSet) -> Self {
        let session = Uuid::new_v4();
        let engine = build_engine(&rules, session, None, false);
        let limiters = RateLimiters::new(&rules);
        Self {
            rules,
            base_dir: PathBuf::from("."),
            engine,
            audit: None,
            limiters,
            quiet: false,
            session,
        }
    }

    /// A session over a loaded policy, auditing where the policy says.
    ///
    /// Failing to open the audit file is logged and the session continues
    /// without auditing; governance decisions never depend on the trail.
    pub fn from_policy(policy: &LoadedPolicy, hmac_key: Option<&[u8]>) -> Self {
        let base_dir = policy.base_dir().to_path_buf();
        let mut gov = Self::new(policy.rules.clone());
        gov.base_dir = base_dir;
        match open_audit_sink(&gov.rules, &gov.base_dir, hmac_key) {
            Ok(Some(sink)) => gov.with_audit_sink(sink),
            Ok(None) => gov,
            Err(e) => {
                obs::emit_audit_write_failed(&e);
                gov
            }
        }
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.engine = build_engine(&self.rules, self.session, Some(sink.clone()), self.quiet);
        self.audit = Some(sink);
        self
    }

    /// Suppress the engine's `[governance]` stderr lines.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self.engine = build_engine(&self.rules, self.session, self.audit.clone(), true);
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Id stamped on every audit record of this session.
    pub fn session_id(&self) -> Uuid {
        self.session
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn engine(&self) -> &EnforcementEngine {
        &self.engine
    }

    /// The sink governance events go to, for wiring into a sandbox.
    pub fn audit_sink(&self) -> Option<Arc<dyn AuditSink>> {
        self.audit.clone()
    }

    pub fn is_active(&self) -> bool {
        self.rules.is_active()
    }

    /// Session-wide override for SOFT violations.
    pub fn set_override(&self, enabled: bool) {
        self.engine.set_override(enabled);
    }

    /// Run the check catalog over one block. `Some(message)` means the block
    /// must not run.
    pub fn check_polyglot_block(
        &self,
        language: &str,
        code: &str,
        source_file: &str,
        line: usize,
    ) -> Option<String> {
        self.check_polyglot_block_traced(language, code, source_file, line)
            .blocked
    }

    /// Same as [`check_polyglot_block`](Self::check_polyglot_block), also
    /// reporting which checks ran.
    pub fn check_polyglot_block_traced(
        &self,
        language: &str,
        code: &str,
        source_file: &str,
        line: usize,
    ) -> BlockOutcome {
        let _span = BlockSpan::enter(language, source_file, line);
        // In OFF mode the checks still run and record results, but nothing
        // blocks, nothing is audited and no hooks fire.
        let active = self.is_active();

        let mut vars = HookVars::new();
        vars.insert("language", language.to_string());
        vars.insert("location", format!("{source_file}:{line}"));
        if active {
            self.engine.hooks().fire(HookEvent::PreCheck, &vars);
        }

        let ctx = BlockContext::new(language, code).at(source_file, line);
        let outcome = run_catalog(&ctx, &self.rules, &self.engine);

        if active {
            vars.insert("blocked", outcome.is_blocked().to_string());
            self.engine.hooks().fire(HookEvent::PostCheck, &vars);
        }
        outcome
    }

    pub fn check_limit(&self, kind: LimitKind, value: usize) -> Option<String> {
        self.decide(|| runtime::check_limit(&self.rules, kind, value))
    }

    pub fn check_network_allowed(&self) -> Option<String> {
        self.decide(|| runtime::check_network(&self.rules))
    }

    /// `mode` is the intent: `"write"` or anything else for read.
    pub fn check_filesystem_allowed(&self, mode: &str) -> Option<String> {
        self.decide(|| runtime::check_filesystem(&self.rules, FsAccess::parse(mode)))
    }

    pub fn check_shell_allowed(&self) -> Option<String> {
        self.decide(|| runtime::check_shell(&self.rules))
    }

    pub fn check_polyglot_output(&self, language: &str, output: &str) -> Option<String> {
        self.decide(|| runtime::check_polyglot_output(&self.rules, language, output))
    }

    /// Count one operation of `kind` against its per-second limit.
    pub fn check_rate(&self, kind: RateKind) -> Option<String> {
        let limiter = self.limiters.get(kind);
        if limiter.try_acquire() {
            return None;
        }
        let v = runtime::rate_violation(kind, limiter.limit());
        let message = v.notice.render(&self.rules.output.errors);
        self.engine.enforce(&v.rule, v.level(), &message)
    }

    fn decide(&self, check: impl FnOnce() -> CheckOutcome) -> Option<String> {
        match check() {
            CheckOutcome::Skipped => None,
            CheckOutcome::Passed { rule, level } => {
                self.engine.record_pass(&rule, level);
                None
            }
            CheckOutcome::Violated(v) => {
                let message = v.notice.render(&self.rules.output.errors);
                self.engine.enforce(&v.rule, v.level(), &message)
            }
        }
    }

    pub fn results(&self) -> Vec<CheckResult> {
        self.engine.results()
    }

    pub fn counts(&self) -> SummaryCounts {
        SummaryCounts::from_results(&self.results())
    }

    pub fn format_summary(&self) -> String {
        format_summary(self.rules.mode, &self.results(), &self.rules.output.summary)
    }

    /// Write every report configured under `output.file_output`.
    pub fn write_reports(&self) -> anyhow::Result<Vec<PathBuf>> {
        report::write_reports(
            &self.rules.output.file_output,
            &self.base_dir,
            self.rules.mode,
            &self.results(),
        )
    }

    /// End the session: fire `on_complete` and return the final counts.
    pub fn finish(&self) -> SummaryCounts {
        let counts = self.counts();
        let mut vars = HookVars::new();
        vars.insert("passed", counts.passed.to_string());
        vars.insert("warned", counts.warned.to_string());
        vars.insert("blocked", counts.blocked.to_string());
        self.engine.hooks().fire(HookEvent::Complete, &vars);
        counts
    }
}

fn build_engine(
    rules: &RuleSet,
    session: Uuid,
    sink: Option<Arc<dyn AuditSink>>,
    quiet: bool,
) -> EnforcementEngine {
    let mut engine = EnforcementEngine::new(rules.mode)
        .with_session(session)
        .with_hooks(HookRunner::new(rules.hooks.clone()));
    if let Some(sink) = sink {
        engine = engine.with_audit(sink, AuditFilter::from(&rules.audit));
    }
    if quiet {
        engine = engine.quiet();
    }
    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEvent, MemoryAuditSink};
    use crate::checks::CATALOG;
    use crate::enforcement::Outcome;
    use serde_json::json;

    fn governance(v: serde_json::Value) -> Governance {
        Governance::new(serde_json::from_value(v).unwrap()).quiet()
    }

    #[test]
    fn test_blocked_language_short_circuits() {
        let gov = governance(json!({ "mode": "enforce", "languages": { "allowed": ["python"] } }));
        let outcome = gov.check_polyglot_block_traced("shell", "ls", "main.naab", 3);
        assert!(outcome.is_blocked());
        assert_eq!(outcome.evaluated, vec!["languages"]);
        let message = outcome.blocked.unwrap();
        assert!(message.contains("languages.allowed"));
    }

    #[test]
    fn test_off_mode_runs_checks_without_blocking() {
        let gov = governance(json!({
            "mode": "off",
            "languages": { "allowed": ["python"] },
            "capabilities": { "shell": false }
        }));
        let outcome = gov.check_polyglot_block_traced("shell", "ls", "", 0);
        assert_eq!(outcome.blocked, None);
        assert_eq!(outcome.evaluated.len(), CATALOG.len());
        assert!(outcome.violations >= 1);
        assert_eq!(gov.check_shell_allowed(), None);

        let results = gov.results();
        let disabled = |rule: &str| {
            results
                .iter()
                .any(|r| r.rule == rule && r.outcome == Outcome::Disabled)
        };
        assert!(disabled("languages.allowed"));
        assert!(disabled("capabilities.shell"));
        assert!(results.iter().all(|r| r.outcome != Outcome::Blocked));
        assert_eq!(gov.counts().blocked, 0);
    }

    #[test]
    fn test_secret_is_blocked_and_masked() {
        let gov = governance(json!({
            "mode": "enforce",
            "code_quality": { "no_secrets": { "enabled": true, "level": "hard" } }
        }));
        let message = gov
            .check_polyglot_block(
                "python",
                "api_key = \"sk-aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\"",
                "app.naab",
                1,
            )
            .unwrap();
        assert!(message.contains("code_quality.no_secrets"));
        assert!(!message.contains("sk-aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
        assert!(message.contains(&format!("sk-a{}aaaa", "*".repeat(27))));
    }

    #[test]
    fn test_soft_override_is_audited_once() {
        let sink = Arc::new(MemoryAuditSink::new());
        let gov = Governance::new(
            serde_json::from_value(json!({
                "mode": "enforce",
                "code_quality": { "no_placeholders": { "enabled": true, "level": "soft" } }
            }))
            .unwrap(),
        )
        .with_audit_sink(sink.clone())
        .quiet();
        gov.set_override(true);
        assert_eq!(gov.check_polyglot_block("python", "# TODO: finish\nx = 1", "", 0), None);
        assert_eq!(sink.count(AuditEvent::Override), 1);
        let session = gov.session_id().to_string();
        assert!(sink.events().iter().all(|e| e.metadata["session"] == session));
        assert!(gov.results().iter().any(|r| r.outcome == Outcome::Overridden));
    }

    #[test]
    fn test_runtime_checks_record_results() {
        let gov = governance(json!({
            "mode": "enforce",
            "capabilities": { "network": false, "shell": true },
            "limits": { "execution": { "call_depth": 2 } }
        }));
        assert!(gov.check_network_allowed().is_some());
        assert_eq!(gov.check_shell_allowed(), None);
        assert!(gov.check_limit(LimitKind::CallDepth, 3).is_some());
        assert_eq!(gov.check_limit(LimitKind::CallDepth, 2), None);
        let counts = gov.finish();
        assert_eq!(counts.passed, 1);
        assert_eq!(counts.blocked, 2);
    }

    #[test]
    fn test_rate_limit_blocks_after_budget() {
        let gov = governance(json!({
            "mode": "enforce",
            "limits": { "rate": { "max_stdlib_calls_per_second": 2 } }
        }));
        assert_eq!(gov.check_rate(RateKind::Stdlib), None);
        assert_eq!(gov.check_rate(RateKind::Stdlib), None);
        let message = gov.check_rate(RateKind::Stdlib).unwrap();
        assert!(message.contains("limits.rate.max_stdlib_calls_per_second"));
        assert_eq!(gov.check_rate(RateKind::Polyglot), None);
    }

    #[test]
    fn test_audit_mode_never_blocks() {
        let gov = governance(json!({ "mode": "audit", "capabilities": { "shell": false } }));
        assert_eq!(gov.check_shell_allowed(), None);
        assert_eq!(gov.results()[0].outcome, Outcome::AuditOnly);
    }

    #[test]
    fn test_open_audit_sink_respects_level() {
        let dir = tempfile::tempdir().unwrap();
        let rules: RuleSet =
            serde_json::from_value(json!({ "audit": { "level": "none" } })).unwrap();
        assert!(open_audit_sink(&rules, dir.path(), None).unwrap().is_none());

        let rules: RuleSet = serde_json::from_value(json!({
            "audit": { "level": "full", "output_file": "logs/audit.jsonl", "tamper_evidence": true }
        }))
        .unwrap();
        let sink = open_audit_sink(&rules, dir.path(), Some(b"k")).unwrap().unwrap();
        sink.record(AuditEvent::CheckFailed, "x", &Default::default()).unwrap();
        assert!(dir.path().join("logs/audit.jsonl").is_file());
    }
}
