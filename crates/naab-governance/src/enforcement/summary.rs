//! End-of-run governance summary.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::engine::{CheckResult, Outcome};
use crate::rules::{GovernanceMode, SummaryOutput};

/// Aggregate counts over recorded results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    pub passed: usize,
    pub warned: usize,
    pub blocked: usize,
}

impl SummaryCounts {
    pub fn from_results(results: &[CheckResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            match r.outcome {
                Outcome::Passed => acc.passed += 1,
                Outcome::Blocked => acc.blocked += 1,
                Outcome::Warned | Outcome::Overridden | Outcome::AuditOnly | Outcome::Disabled => {
                    acc.warned += 1
                }
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.passed + self.warned + self.blocked
    }
}

/// Render the summary. One line per rule; a rule that both passed and
/// failed is shown by its worst outcome.
pub fn format_summary(
    mode: GovernanceMode,
    results: &[CheckResult],
    opts: &SummaryOutput,
) -> String {
    let counts = SummaryCounts::from_results(results);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[governance] Summary (mode: {mode}): {} passed, {} warning{}, {} blocked",
        counts.passed,
        counts.warned,
        if counts.warned == 1 { "" } else { "s" },
        counts.blocked
    );

    let mut per_rule: BTreeMap<&str, &CheckResult> = BTreeMap::new();
    for r in results {
        per_rule
            .entry(r.rule.as_str())
            .and_modify(|existing| {
                if severity(r.outcome) > severity(existing.outcome) {
                    *existing = r;
                }
            })
            .or_insert(r);
    }

    for r in per_rule.values() {
        let (mark, status) = match r.outcome {
            Outcome::Passed => ("\u{2713}", "PASS"),
            Outcome::Blocked => ("\u{2717}", "BLOCKED"),
            Outcome::Overridden => ("\u{26a0}", "OVERRIDDEN"),
            Outcome::Warned | Outcome::AuditOnly | Outcome::Disabled => ("\u{26a0}", "WARN"),
        };
        if r.outcome == Outcome::Passed && !opts.show_passing {
            continue;
        }
        let _ = writeln!(out, "  {mark} {:<35} [{}]  {status}", r.rule, r.level);
    }
    out
}

fn severity(outcome: Outcome) -> u8 {
    match outcome {
        Outcome::Passed => 0,
        Outcome::Disabled => 1,
        Outcome::AuditOnly | Outcome::Warned => 2,
        Outcome::Overridden => 3,
        Outcome::Blocked => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::EnforcementLevel;

    fn result(rule: &str, outcome: Outcome) -> CheckResult {
        CheckResult {
            rule: rule.into(),
            level: EnforcementLevel::Hard,
            passed: outcome == Outcome::Passed,
            outcome,
            message: None,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_counts() {
        let results = vec![
            result("a", Outcome::Passed),
            result("b", Outcome::Blocked),
            result("c", Outcome::Warned),
            result("d", Outcome::Overridden),
        ];
        let counts = SummaryCounts::from_results(&results);
        assert_eq!(
            counts,
            SummaryCounts {
                passed: 1,
                warned: 2,
                blocked: 1
            }
        );
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_summary_dedupes_by_worst() {
        let results = vec![
            result("languages", Outcome::Passed),
            result("languages", Outcome::Blocked),
            result("languages", Outcome::Passed),
        ];
        let text = format_summary(GovernanceMode::Enforce, &results, &SummaryOutput::default());
        assert!(text.starts_with(
            "[governance] Summary (mode: enforce): 2 passed, 0 warnings, 1 blocked",
        ));
        assert_eq!(text.matches("languages").count(), 1);
        assert!(text.contains("BLOCKED"));
    }

    #[test]
    fn test_hide_passing() {
        let results = vec![result("a", Outcome::Passed), result("b", Outcome::Warned)];
        let opts = SummaryOutput {
            enabled: true,
            show_passing: false,
        };
        let text = format_summary(GovernanceMode::Audit, &results, &opts);
        assert!(!text.contains("  \u{2713} a"));
        assert!(text.contains("WARN"));
    }
}
