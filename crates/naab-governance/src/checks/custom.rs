//! User-authored regex rules from `custom_rules`.

use super::{BlockContext, CheckOutcome};
use crate::enforcement::ViolationNotice;
use crate::rules::{EnforcementLevel, RuleSet};

/// Each applicable rule is tried in declaration order; the first match is
/// the violation. Rules whose pattern does not compile were disabled at
/// load time and are skipped here as well.
pub fn check_custom_rules(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    _default: EnforcementLevel,
) -> CheckOutcome {
    let applicable = rules
        .custom_rules
        .iter()
        .filter(|r| r.enabled && r.applies_to(ctx.language));

    let mut evaluated = false;
    for rule in applicable {
        let Ok(re) = rule.compile() else {
            continue;
        };
        evaluated = true;
        if re.is_match(ctx.code) {
            let what = if rule.message.is_empty() {
                format!("Custom rule '{}' violated", rule.display_name())
            } else {
                rule.message.clone()
            };
            let notice = ViolationNotice::new(rule.level, what)
                .at(ctx.location())
                .rule_text(format!("custom_rules[\"{}\"]", rule.id))
                .help(rule.help.clone())
                .examples(rule.bad_example.clone(), rule.good_example.clone());
            return CheckOutcome::violation(format!("custom_rules.{}", rule.id), notice);
        }
    }

    if evaluated {
        CheckOutcome::pass("custom_rules", EnforcementLevel::Hard)
    } else {
        CheckOutcome::Skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(v: serde_json::Value) -> RuleSet {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_custom_rule_violation() {
        let r = rules(json!({
            "custom_rules": [{
                "id": "no-print",
                "name": "No print",
                "pattern": "\\bprint\\(",
                "languages": ["python"],
                "level": "soft",
                "help": "Use logging",
                "bad_example": "print(x)",
                "good_example": "log.info(x)"
            }]
        }));
        match check_custom_rules(
            &BlockContext::new("python", "print(1)"),
            &r,
            EnforcementLevel::Hard,
        ) {
            CheckOutcome::Violated(v) => {
                assert_eq!(v.rule, "custom_rules.no-print");
                assert_eq!(v.level(), EnforcementLevel::Soft);
                assert_eq!(v.notice.what, "Custom rule 'No print' violated");
                assert_eq!(v.notice.rule_path, "custom_rules[\"no-print\"]");
                assert_eq!(v.notice.good_example, "log.info(x)");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_language_filter_and_disabled() {
        let r = rules(json!({
            "custom_rules": [
                { "id": "a", "pattern": "foo", "languages": ["javascript"] },
                { "id": "b", "pattern": "foo", "enabled": false }
            ]
        }));
        assert_eq!(
            check_custom_rules(&BlockContext::new("python", "foo"), &r, EnforcementLevel::Hard),
            CheckOutcome::Skipped
        );
    }

    #[test]
    fn test_case_insensitive_by_default_and_message() {
        let r = rules(json!({
            "custom_rules": [{ "id": "x", "pattern": "select \\*", "message": "No SELECT *" }]
        }));
        match check_custom_rules(
            &BlockContext::new("sql", "SELECT * FROM t"),
            &r,
            EnforcementLevel::Hard,
        ) {
            CheckOutcome::Violated(v) => assert_eq!(v.notice.what, "No SELECT *"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            check_custom_rules(
                &BlockContext::new("sql", "SELECT id FROM t"),
                &r,
                EnforcementLevel::Hard,
            ),
            CheckOutcome::Passed { .. }
        ));
    }
}
