//! Credential and PII detection.

use regex::{Regex, RegexBuilder};

use super::{BlockContext, CheckOutcome};
use crate::enforcement::{mask_secret, ViolationNotice};
use crate::rules::{EnforcementLevel, RuleSet};

/// (pattern, description)
const SECRET_PATTERNS: &[(&str, &str)] = &[
    (r"sk-[a-zA-Z0-9]{32,}", "OpenAI API Key"),
    (r"sk-ant-[a-zA-Z0-9\-]{20,}", "Anthropic API Key"),
    (r"ghp_[a-zA-Z0-9]{36,}", "GitHub Personal Access Token"),
    (r"gho_[a-zA-Z0-9]{36,}", "GitHub OAuth Token"),
    (r"AKIA[0-9A-Z]{16}", "AWS Access Key ID"),
    (r"-----BEGIN[\s\S]*PRIVATE KEY-----", "Private Key"),
    (r"xox[bpsa]-[0-9]{10,13}-[0-9]{10,13}-[a-zA-Z0-9]{24}", "Slack Token"),
    (r"(?:sk|pk)_(?:test|live)_[a-zA-Z0-9]{24,}", "Stripe Key"),
    (r"SG\.[a-zA-Z0-9_-]{22}\.[a-zA-Z0-9_-]{43}", "SendGrid Key"),
    (r"AIza[0-9A-Za-z\-_]{35}", "Google API Key"),
    (r"eyJ[a-zA-Z0-9_-]*\.[a-zA-Z0-9_-]*\.[a-zA-Z0-9_-]*", "JWT Token"),
    (r"(?:mongodb|postgres|mysql|redis)://[^\s]+", "Connection String"),
    (r"Bearer\s+[A-Za-z0-9\-._~+/]+=*", "Bearer Token"),
    (r#"password\s*=\s*['"][^'"]{8,}['"]"#, "Hardcoded Password"),
    (r#"api[_-]?key\s*=\s*['"][^'"]{20,}['"]"#, "API Key Assignment"),
    (r#"token\s*=\s*['"][^'"]{20,}['"]"#, "Hardcoded Token"),
    (r#"secret\s*=\s*['"][^'"]{8,}['"]"#, "Hardcoded Secret"),
    (r#"aws_secret_access_key\s*=\s*['"][^'"]{40}['"]"#, "AWS Secret Key"),
];

const PII_SSN: &str = r"\b\d{3}-\d{2}-\d{4}\b";
const PII_CARD: &str = r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b";
const PII_EMAIL: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
const PII_PHONE: &str = r"\b(?:\+?1[-.]?)?\d{3}[-.]?\d{3}[-.]?\d{4}\b";
const PII_IP: &str =
    r"\b(?:(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\b";

pub fn check_secrets(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "code_quality.no_secrets";
    let cfg = &rules.code_quality.no_secrets;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);

    let patterns = SECRET_PATTERNS.iter().map(|(p, d)| (*p, *d)).chain(
        cfg.custom_patterns
            .iter()
            .map(|p| (p.as_str(), "Custom secret pattern")),
    );

    for (pattern, description) in patterns {
        let Ok(re) = RegexBuilder::new(pattern).case_insensitive(true).build() else {
            continue;
        };
        let found = re
            .find_iter(ctx.code)
            .find(|m| !cfg.allowlist.iter().any(|a| m.as_str().contains(a.as_str())));
        if let Some(m) = found {
            let masked = mask_secret(m.as_str());
            let notice = ViolationNotice::new(level, format!("Secret detected: {description}"))
                .at(ctx.location_with(&masked))
                .rule(RULE)
                .help("Never hardcode secrets in source code\nUse environment variables instead")
                .examples(
                    format!("{description} = \"{masked}\""),
                    "import os\nkey = os.environ[\"YOUR_KEY_NAME\"]\n\n  In NAAb:\n    let key = env.get_var(\"YOUR_KEY_NAME\")",
                );
            return CheckOutcome::violation(RULE, notice);
        }
    }
    CheckOutcome::pass(RULE, level)
}

/// First three characters visible, the rest starred.
fn mask_pii(found: &str) -> String {
    let head: String = found.chars().take(3).collect();
    let rest = found.chars().count().saturating_sub(3);
    format!("{head}{}", "*".repeat(rest))
}

pub fn check_pii(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "code_quality.no_pii";
    let cfg = &rules.code_quality.no_pii;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);

    let detectors = [
        (cfg.detect_ssn, PII_SSN, "SSN"),
        (cfg.detect_credit_card, PII_CARD, "Credit Card"),
        (cfg.detect_email, PII_EMAIL, "Email"),
        (cfg.detect_phone, PII_PHONE, "Phone"),
        (cfg.detect_ip_address, PII_IP, "IP Address"),
    ];

    for (_, pattern, description) in detectors.iter().filter(|(on, _, _)| *on) {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        let found = re.find_iter(ctx.code).find(|m| {
            !cfg.allowlist_patterns
                .iter()
                .any(|a| m.as_str().contains(a.as_str()))
        });
        if let Some(m) = found {
            let display = if cfg.mask_in_errors {
                mask_pii(m.as_str())
            } else {
                m.as_str().to_string()
            };
            let notice = ViolationNotice::new(
                level,
                format!("PII detected: {description} ({display})"),
            )
            .at(ctx.location())
            .rule(RULE)
            .help(
                "Remove personally identifiable information from code\n\
                 Use environment variables or config files instead",
            );
            return CheckOutcome::violation(RULE, notice);
        }
    }
    CheckOutcome::pass(RULE, level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(v: serde_json::Value) -> RuleSet {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_openai_key_is_masked() {
        let r = rules(json!({ "code_quality": { "no_secrets": true } }));
        let code = format!("api = \"sk-{}\"", "a".repeat(32));
        let ctx = BlockContext::new("python", &code).at("main.naab", 4);
        match check_secrets(&ctx, &r, EnforcementLevel::Hard) {
            CheckOutcome::Violated(v) => {
                assert_eq!(v.rule, "code_quality.no_secrets");
                assert_eq!(v.notice.what, "Secret detected: OpenAI API Key");
                assert!(v.notice.location.starts_with("line 4: sk-a"));
                assert!(v.notice.location.ends_with("aaaa"));
                assert!(v.notice.location.contains('*'));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_allowlist_skips_match() {
        let r = rules(json!({
            "code_quality": { "no_secrets": { "enabled": true, "allowlist": ["sk-test"] } }
        }));
        let code = format!("k = \"sk-test{}\"", "b".repeat(30));
        let out = check_secrets(&BlockContext::new("python", &code), &r, EnforcementLevel::Hard);
        assert!(matches!(out, CheckOutcome::Passed { .. }));
    }

    #[test]
    fn test_custom_secret_pattern() {
        let r = rules(json!({
            "code_quality": {
                "no_secrets": { "enabled": true, "custom_patterns": ["corp_[0-9]{6}"] }
            }
        }));
        let out = check_secrets(
            &BlockContext::new("python", "t = 'corp_123456'"),
            &r,
            EnforcementLevel::Hard,
        );
        match out {
            CheckOutcome::Violated(v) => assert!(v.notice.what.contains("Custom secret pattern")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_disabled_is_skipped() {
        let out = check_secrets(
            &BlockContext::new("python", "password = 'hunter2hunter2'"),
            &RuleSet::default(),
            EnforcementLevel::Hard,
        );
        assert_eq!(out, CheckOutcome::Skipped);
    }

    #[test]
    fn test_pii_email_masked() {
        let r = rules(json!({ "code_quality": { "no_pii": true } }));
        let out = check_pii(
            &BlockContext::new("python", "to = 'alice@corp.io'"),
            &r,
            EnforcementLevel::Advisory,
        );
        match out {
            CheckOutcome::Violated(v) => {
                assert_eq!(v.notice.what, "PII detected: Email (ali**********)");
                assert_eq!(v.level(), EnforcementLevel::Advisory);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_pii_allowlist_and_unmasked() {
        let r = rules(json!({
            "code_quality": { "no_pii": {
                "enabled": true,
                "allowlist_patterns": ["example.com"],
                "mask_in_errors": false,
                "detect_phone": false
            } }
        }));
        let out = check_pii(
            &BlockContext::new("python", "a = 'x@example.com'"),
            &r,
            EnforcementLevel::Advisory,
        );
        assert!(matches!(out, CheckOutcome::Passed { .. }));

        let out = check_pii(
            &BlockContext::new("python", "ssn = '123-45-6789'"),
            &r,
            EnforcementLevel::Advisory,
        );
        match out {
            CheckOutcome::Violated(v) => assert!(v.notice.what.contains("123-45-6789")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
