//! Static checks over polyglot block source.
//!
//! Checks are plain functions registered in [`CATALOG`] with an id, a
//! category and a default level. The orchestrator walks the catalog in
//! order and stops at the first decision that blocks.
//!
//! # Modules
//!
//! - [`language`]     : allow/block lists, imports, banned functions, style, size
//! - [`secrets`]      : credentials and PII
//! - [`completeness`] : placeholders, hardcoded results, temporary/simulated code
//! - [`hygiene`]      : dead code, debug artifacts, unsafe inputs, encoding, size
//! - [`anti_drift`]   : oversimplification, incomplete logic, hallucinated APIs
//! - [`security`]     : dangerous calls and the restriction categories
//! - [`custom`]       : user-authored regex rules
//! - [`runtime`]      : limits and capability checks called by the host

pub mod anti_drift;
pub mod completeness;
pub mod custom;
pub mod hygiene;
pub mod language;
pub mod runtime;
pub mod secrets;
pub mod security;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::enforcement::{EnforcementEngine, ViolationNotice};
use crate::obs;
use crate::rules::{EnforcementLevel, PatternCheck, RuleSet};

/// The block under inspection.
#[derive(Debug, Clone, Copy)]
pub struct BlockContext<'a> {
    pub language: &'a str,
    pub code: &'a str,
    pub source_file: &'a str,
    /// 1-based line of the block in the host file; 0 when unknown.
    pub line: usize,
}

impl<'a> BlockContext<'a> {
    pub fn new(language: &'a str, code: &'a str) -> Self {
        Self {
            language,
            code,
            source_file: "",
            line: 0,
        }
    }

    pub fn at(mut self, source_file: &'a str, line: usize) -> Self {
        self.source_file = source_file;
        self.line = line;
        self
    }

    /// `line N`, or empty when the line is unknown.
    pub fn location(&self) -> String {
        if self.line > 0 {
            format!("line {}", self.line)
        } else {
            String::new()
        }
    }

    /// `line N: detail`, or just `detail`.
    pub fn location_with(&self, detail: &str) -> String {
        if self.line > 0 {
            format!("line {}: {detail}", self.line)
        } else {
            detail.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Language,
    Secrets,
    Completeness,
    Hygiene,
    AntiDrift,
    Security,
    PerLanguage,
    Custom,
}

/// A failed check, ready for the enforcement engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: String,
    pub notice: ViolationNotice,
}

impl Violation {
    pub fn level(&self) -> EnforcementLevel {
        self.notice.level
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Disabled or not applicable to this block.
    Skipped,
    Passed {
        rule: String,
        level: EnforcementLevel,
    },
    Violated(Violation),
}

impl CheckOutcome {
    pub fn pass(rule: impl Into<String>, level: EnforcementLevel) -> Self {
        CheckOutcome::Passed {
            rule: rule.into(),
            level,
        }
    }

    pub fn violation(rule: impl Into<String>, notice: ViolationNotice) -> Self {
        CheckOutcome::Violated(Violation {
            rule: rule.into(),
            notice,
        })
    }
}

/// Signature of every catalog check. The level argument is the
/// descriptor's default, used when the policy does not set one.
pub type CheckFn = fn(&BlockContext<'_>, &RuleSet, EnforcementLevel) -> CheckOutcome;

#[derive(Clone, Copy)]
pub struct CheckDescriptor {
    pub id: &'static str,
    pub category: CheckCategory,
    pub default_level: EnforcementLevel,
    pub run: CheckFn,
}

impl std::fmt::Debug for CheckDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckDescriptor")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("default_level", &self.default_level)
            .finish()
    }
}

const fn check(
    id: &'static str,
    category: CheckCategory,
    default_level: EnforcementLevel,
    run: CheckFn,
) -> CheckDescriptor {
    CheckDescriptor {
        id,
        category,
        default_level,
        run,
    }
}

use CheckCategory as C;
use EnforcementLevel::{Advisory, Hard, Soft};

/// Every block check, in evaluation order.
pub static CATALOG: &[CheckDescriptor] = &[
    check("languages", C::Language, Hard, language::check_language_allowed),
    check("code_quality.no_secrets", C::Secrets, Hard, secrets::check_secrets),
    check("code_quality.no_placeholders", C::Completeness, Soft, completeness::check_placeholders),
    check(
        "code_quality.no_hardcoded_results",
        C::Completeness,
        Advisory,
        completeness::check_hardcoded_results,
    ),
    check("restrictions.dangerous_calls", C::Security, Hard, security::check_dangerous_calls),
    check("code_quality.no_pii", C::Secrets, Advisory, secrets::check_pii),
    check(
        "code_quality.no_temporary_code",
        C::Completeness,
        Soft,
        completeness::check_temporary_code,
    ),
    check(
        "code_quality.no_simulation_markers",
        C::Completeness,
        Hard,
        completeness::check_simulation_markers,
    ),
    check("code_quality.no_mock_data", C::Completeness, Advisory, completeness::check_mock_data),
    check(
        "code_quality.no_apologetic_language",
        C::Completeness,
        Advisory,
        completeness::check_apologetic_language,
    ),
    check("code_quality.no_dead_code", C::Hygiene, Advisory, hygiene::check_dead_code),
    check("code_quality.no_debug_artifacts", C::Hygiene, Soft, hygiene::check_debug_artifacts),
    check(
        "code_quality.no_unsafe_deserialization",
        C::Hygiene,
        Hard,
        hygiene::check_unsafe_deserialization,
    ),
    check("code_quality.no_sql_injection", C::Hygiene, Hard, hygiene::check_sql_injection),
    check("code_quality.no_path_traversal", C::Hygiene, Hard, hygiene::check_path_traversal),
    check("code_quality.no_hardcoded_urls", C::Hygiene, Advisory, hygiene::check_hardcoded_urls),
    check("code_quality.no_hardcoded_ips", C::Hygiene, Advisory, hygiene::check_hardcoded_ips),
    check("code_quality.encoding", C::Hygiene, Advisory, hygiene::check_encoding),
    check("code_quality.max_complexity", C::Hygiene, Advisory, hygiene::check_complexity),
    check(
        "code_quality.no_oversimplification",
        C::AntiDrift,
        Soft,
        anti_drift::check_oversimplification,
    ),
    check(
        "code_quality.no_incomplete_logic",
        C::AntiDrift,
        Soft,
        anti_drift::check_incomplete_logic,
    ),
    check(
        "code_quality.no_hallucinated_apis",
        C::AntiDrift,
        Advisory,
        anti_drift::check_hallucinated_apis,
    ),
    check("restrictions.shell_injection", C::Security, Hard, security::check_shell_injection),
    check("restrictions.code_injection", C::Security, Hard, security::check_code_injection),
    check(
        "restrictions.privilege_escalation",
        C::Security,
        Hard,
        security::check_privilege_escalation,
    ),
    check("restrictions.data_exfiltration", C::Security, Hard, security::check_data_exfiltration),
    check("restrictions.resource_abuse", C::Security, Hard, security::check_resource_abuse),
    check(
        "restrictions.information_disclosure",
        C::Security,
        Soft,
        security::check_information_disclosure,
    ),
    check("restrictions.crypto", C::Security, Advisory, security::check_crypto),
    check("restrictions.imports", C::PerLanguage, Soft, language::check_imports),
    check(
        "languages.per_language.banned_functions",
        C::PerLanguage,
        Hard,
        language::check_banned_functions,
    ),
    check("languages.per_language.style", C::PerLanguage, Soft, language::check_style),
    check("languages.per_language.max_lines", C::PerLanguage, Hard, language::check_code_size),
    check("custom_rules", C::Custom, Hard, custom::check_custom_rules),
];

pub fn catalog() -> &'static [CheckDescriptor] {
    CATALOG
}

pub fn descriptor(id: &str) -> Option<&'static CheckDescriptor> {
    CATALOG.iter().find(|d| d.id == id)
}

/// Result of running the catalog over one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockOutcome {
    /// Blocking message, if execution must stop.
    pub blocked: Option<String>,
    /// Ids of checks that ran, in order.
    pub evaluated: Vec<&'static str>,
    /// Violations raised, blocking or not.
    pub violations: usize,
}

impl BlockOutcome {
    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }
}

/// Run every catalog check over `ctx`, recording results on `engine`.
/// Stops at the first violation the engine turns into a block.
pub fn run_catalog(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    engine: &EnforcementEngine,
) -> BlockOutcome {
    let mut outcome = BlockOutcome::default();
    for desc in CATALOG {
        outcome.evaluated.push(desc.id);
        match (desc.run)(ctx, rules, desc.default_level) {
            CheckOutcome::Skipped => {}
            CheckOutcome::Passed { rule, level } => engine.record_pass(&rule, level),
            CheckOutcome::Violated(v) => {
                outcome.violations += 1;
                let message = v.notice.render(&rules.output.errors);
                if let Some(block) = engine.enforce(&v.rule, v.level(), &message) {
                    outcome.blocked = Some(block);
                    break;
                }
            }
        }
    }
    obs::emit_block_checked(ctx.language, outcome.evaluated.len(), outcome.is_blocked());
    outcome
}

// ---------------------------------------------------------------------------
// Pattern helpers shared by the check modules
// ---------------------------------------------------------------------------

/// First match of any pattern that contains no allowlist entry. Patterns
/// that fail to compile are skipped.
pub(crate) fn scan<S: AsRef<str>>(
    code: &str,
    patterns: &[S],
    case_insensitive: bool,
    allowlist: &[String],
) -> Option<String> {
    for pattern in patterns {
        let Ok(re) = RegexBuilder::new(pattern.as_ref())
            .case_insensitive(case_insensitive)
            .multi_line(true)
            .build()
        else {
            continue;
        };
        let found = re
            .find_iter(code)
            .find(|m| !allowlist.iter().any(|a| m.as_str().contains(a.as_str())))
            .map(|m| m.as_str().to_string());
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Configured patterns replace the defaults; custom patterns are appended.
pub(crate) fn effective_patterns(cfg: &PatternCheck, defaults: &[&str]) -> Vec<String> {
    let base: Vec<String> = if cfg.patterns.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        cfg.patterns.clone()
    };
    base.into_iter()
        .chain(cfg.custom_patterns.iter().cloned())
        .collect()
}

/// Shared body for checks that are "any of these patterns is a violation".
pub(crate) fn pattern_check(
    ctx: &BlockContext<'_>,
    cfg: &PatternCheck,
    rule: &str,
    default_level: EnforcementLevel,
    defaults: &[&str],
    describe: impl FnOnce(&str) -> ViolationNotice,
) -> CheckOutcome {
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default_level);
    let patterns = effective_patterns(cfg, defaults);
    match scan(ctx.code, &patterns, !cfg.case_sensitive, &cfg.allowlist) {
        Some(found) => {
            let mut notice = describe(&found);
            notice.level = level;
            CheckOutcome::violation(rule, notice.at(ctx.location()).rule(rule))
        }
        None => CheckOutcome::pass(rule, level),
    }
}

/// `code.lines()` disagrees with a trailing newline; count separators.
pub(crate) fn line_count(code: &str) -> usize {
    code.matches('\n').count() + 1
}
