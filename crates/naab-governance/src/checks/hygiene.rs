//! Code hygiene: dead code, debug leftovers, unsafe inputs, hardcoded
//! endpoints, hostile encodings and oversized blocks.

use regex::Regex;

use super::{line_count, pattern_check, scan, BlockContext, CheckOutcome};
use crate::enforcement::ViolationNotice;
use crate::rules::{EnforcementLevel, RuleSet};

const DEAD_CODE_PATTERNS: &[&str] = &[
    r"if\s+(?:True|1)\s*:",
    r"if\s+(?:False|0)\s*:",
    r"except:\s*(?:pass|\.\.\.)\s*$",
];

const DEBUG_PATTERNS: &[&str] = &[
    r"print\(.*debug",
    r"console\.log\(",
    r"console\.debug\(",
    r"System\.out\.println\(",
    r"fmt\.Println\(",
    r"import\s+pdb",
    r"import\s+ipdb",
    r"breakpoint\(\)",
    r"debugger;?",
    r"binding\.pry",
];

const DESER_PATTERNS: &[&str] = &[
    r"pickle\.loads?\(",
    r"yaml\.load\(",
    r"yaml\.unsafe_load",
    r"marshal\.load",
    r"shelve\.open",
    r"jsonpickle\.decode",
    r"unserialize\(",
    r"ObjectInputStream",
    r"BinaryFormatter\.Deserialize",
];

const SQL_PATTERNS: &[&str] = &[
    r#"(?:SELECT|INSERT|UPDATE|DELETE|DROP|ALTER)\s+.*['"]\s*\+"#,
    r"(?:SELECT|INSERT|UPDATE|DELETE)\s+.*%s",
    r#"f['"].*(?:SELECT|INSERT|UPDATE|DELETE).*\{"#,
    r"\.format\(.*(?:SELECT|INSERT|UPDATE|DELETE)",
];

const PATH_TRAVERSAL_PATTERNS: &[&str] = &[r"\.\./", r"\.\.\\", "%2e%2e%2f", "%2e%2e/", r"\.\.%2f"];

const URL_PATTERN: &str = r"https?://[a-zA-Z0-9.-]+";
const LOCAL_HOSTS: &[&str] = &["example.com", "localhost", "127.0.0.1", "0.0.0.0"];

const IP_PATTERN: &str =
    r"\b(?:(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\b";
const DEFAULT_IP_ALLOW: &[&str] = &["127.0.0.1", "0.0.0.0", "255.255.255.0", "255.255.255.255"];

/// Directional embeddings, overrides and isolates.
const BIDI_CONTROLS: &[char] = &[
    '\u{202A}', '\u{202B}', '\u{202C}', '\u{202D}', '\u{202E}', '\u{2066}', '\u{2067}', '\u{2068}',
    '\u{2069}',
];

pub fn check_dead_code(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    pattern_check(
        ctx,
        &rules.code_quality.no_dead_code,
        "code_quality.no_dead_code",
        default,
        DEAD_CODE_PATTERNS,
        |found| {
            ViolationNotice::new(default, format!("Dead code pattern: \"{found}\""))
                .help("Remove dead/unreachable code")
        },
    )
}

pub fn check_debug_artifacts(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    let lang = ctx.language;
    pattern_check(
        ctx,
        &rules.code_quality.no_debug_artifacts,
        "code_quality.no_debug_artifacts",
        default,
        DEBUG_PATTERNS,
        |found| {
            ViolationNotice::new(default, format!("Debug artifact in {lang} block: \"{found}\""))
                .help("Remove debug statements before deployment")
        },
    )
}

pub fn check_unsafe_deserialization(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    pattern_check(
        ctx,
        &rules.code_quality.no_unsafe_deserialization,
        "code_quality.no_unsafe_deserialization",
        default,
        DESER_PATTERNS,
        |found| {
            ViolationNotice::new(default, format!("Unsafe deserialization: \"{found}\""))
                .help("Use safe deserialization methods (json.loads, yaml.safe_load)")
        },
    )
}

pub fn check_sql_injection(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    pattern_check(
        ctx,
        &rules.code_quality.no_sql_injection,
        "code_quality.no_sql_injection",
        default,
        SQL_PATTERNS,
        |_| {
            ViolationNotice::new(default, "SQL injection pattern detected")
                .help("Use parameterized queries instead of string concatenation")
                .examples(
                    "cursor.execute(\"SELECT * FROM users WHERE id=\" + user_id)",
                    "cursor.execute(\"SELECT * FROM users WHERE id=?\", (user_id,))",
                )
        },
    )
}

pub fn check_path_traversal(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    pattern_check(
        ctx,
        &rules.code_quality.no_path_traversal,
        "code_quality.no_path_traversal",
        default,
        PATH_TRAVERSAL_PATTERNS,
        |_| {
            ViolationNotice::new(default, "Path traversal pattern detected")
                .help("Use absolute paths or os.path.realpath() to prevent traversal")
        },
    )
}

/// Local and documentation hosts never count as hardcoded.
fn is_local_url(url: &str) -> bool {
    let host = url.split_once("://").map_or(url, |(_, rest)| rest);
    LOCAL_HOSTS.iter().any(|h| host.starts_with(h))
}

pub fn check_hardcoded_urls(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "code_quality.no_hardcoded_urls";
    let cfg = &rules.code_quality.no_hardcoded_urls;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);

    let mut found = Regex::new(URL_PATTERN).ok().and_then(|re| {
        re.find_iter(ctx.code)
            .map(|m| m.as_str())
            .find(|url| {
                !is_local_url(url) && !cfg.allowlist.iter().any(|a| url.contains(a.as_str()))
            })
            .map(str::to_string)
    });
    if found.is_none() && !cfg.custom_patterns.is_empty() {
        found = scan(ctx.code, &cfg.custom_patterns, !cfg.case_sensitive, &cfg.allowlist);
    }

    match found {
        Some(url) => {
            let notice = ViolationNotice::new(level, format!("Hardcoded URL: \"{url}\""))
                .at(ctx.location())
                .rule(RULE)
                .help("Use configuration or environment variables for URLs");
            CheckOutcome::violation(RULE, notice)
        }
        None => CheckOutcome::pass(RULE, level),
    }
}

/// Exact-match allow list; the configured list replaces the defaults.
pub fn check_hardcoded_ips(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "code_quality.no_hardcoded_ips";
    let cfg = &rules.code_quality.no_hardcoded_ips;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);
    let allowed = |ip: &str| {
        if cfg.allowlist.is_empty() {
            DEFAULT_IP_ALLOW.contains(&ip)
        } else {
            cfg.allowlist.iter().any(|a| a == ip)
        }
    };

    let found = Regex::new(IP_PATTERN).ok().and_then(|re| {
        re.find_iter(ctx.code)
            .map(|m| m.as_str())
            .find(|ip| !allowed(*ip))
            .map(str::to_string)
    });

    match found {
        Some(ip) => {
            let notice = ViolationNotice::new(level, format!("Hardcoded IP: \"{ip}\""))
                .at(ctx.location())
                .rule(RULE)
                .help("Use configuration or DNS for IP addresses");
            CheckOutcome::violation(RULE, notice)
        }
        None => CheckOutcome::pass(RULE, level),
    }
}

pub fn check_encoding(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "code_quality.encoding";
    let cfg = &rules.code_quality.encoding;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);

    if cfg.block_null_bytes && ctx.code.contains('\0') {
        let notice = ViolationNotice::new(level, "Null byte detected in code")
            .at(ctx.location())
            .rule_text("code_quality.encoding.block_null_bytes")
            .help("Null bytes can be used for injection attacks");
        return CheckOutcome::violation(RULE, notice);
    }
    if cfg.block_unicode_bidi && ctx.code.contains(BIDI_CONTROLS) {
        let notice = ViolationNotice::new(
            level,
            "Unicode bidirectional override character detected",
        )
        .at(ctx.location())
        .rule_text("code_quality.encoding.block_unicode_bidi")
        .help("Bidi override characters can be used for trojan source attacks");
        return CheckOutcome::violation(RULE, notice);
    }
    CheckOutcome::pass(RULE, level)
}

/// Deepest nesting by brace depth or by indentation (a tab or four
/// spaces per level), whichever is larger.
fn nesting_depth(code: &str) -> usize {
    let mut depth = 0usize;
    let mut max_brace = 0usize;
    for c in code.chars() {
        match c {
            '{' | '[' | '(' => {
                depth += 1;
                max_brace = max_brace.max(depth);
            }
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    let max_indent = code
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            let mut width = 0;
            for c in l.chars() {
                match c {
                    ' ' => width += 1,
                    '\t' => width += 4,
                    _ => break,
                }
            }
            width / 4
        })
        .max()
        .unwrap_or(0);
    max_brace.max(max_indent)
}

pub fn check_complexity(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "code_quality.max_complexity";
    let cfg = &rules.code_quality.max_complexity;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);

    if cfg.max_lines_per_block > 0 {
        let lines = line_count(ctx.code);
        if lines > cfg.max_lines_per_block {
            let notice = ViolationNotice::new(
                level,
                format!("Block has {lines} lines (max: {})", cfg.max_lines_per_block),
            )
            .at(ctx.location())
            .rule_text("code_quality.max_complexity.max_lines_per_block")
            .help("Break large blocks into smaller functions or multiple blocks");
            return CheckOutcome::violation(RULE, notice);
        }
    }
    if cfg.max_nesting_depth > 0 {
        let depth = nesting_depth(ctx.code);
        if depth > cfg.max_nesting_depth {
            let notice = ViolationNotice::new(
                level,
                format!("Block nests {depth} levels deep (max: {})", cfg.max_nesting_depth),
            )
            .at(ctx.location())
            .rule_text("code_quality.max_complexity.max_nesting_depth")
            .help("Flatten nested logic with early returns or helper functions");
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

    fn violated(out: CheckOutcome) -> crate::checks::Violation {
        match out {
            CheckOutcome::Violated(v) => v,
            other => panic!("expected violation, got {other:?}"),
        }
    }

    fn passed(out: &CheckOutcome) -> bool {
        matches!(out, CheckOutcome::Passed { .. })
    }

    #[test]
    fn test_dead_code_bare_except_at_line_end() {
        let r = rules(json!({ "code_quality": { "no_dead_code": true } }));
        let code = "try:\n    go()\nexcept: pass\nprint(1)";
        let v = violated(check_dead_code(
            &BlockContext::new("python", code),
            &r,
            EnforcementLevel::Advisory,
        ));
        assert!(v.notice.what.contains("except: pass"));
    }

    #[test]
    fn test_debug_allowlist() {
        let r = rules(json!({
            "code_quality": {
                "no_debug_artifacts": { "enabled": true, "allowlist": ["console.log("] }
            }
        }));
        assert!(passed(&check_debug_artifacts(
            &BlockContext::new("javascript", "console.log(x)"),
            &r,
            EnforcementLevel::Soft
        )));
        let v = violated(check_debug_artifacts(
            &BlockContext::new("python", "import pdb"),
            &r,
            EnforcementLevel::Soft,
        ));
        assert_eq!(v.notice.what, "Debug artifact in python block: \"import pdb\"");
    }

    #[test]
    fn test_sql_injection_has_examples() {
        let r = rules(json!({ "code_quality": { "no_sql_injection": true } }));
        let v = violated(check_sql_injection(
            &BlockContext::new("python", "q = \"SELECT * FROM t WHERE id=\" + uid"),
            &r,
            EnforcementLevel::Hard,
        ));
        assert!(v.notice.good_example.contains("id=?"));
    }

    #[test]
    fn test_path_traversal_and_deser() {
        let r = rules(json!({
            "code_quality": { "no_path_traversal": true, "no_unsafe_deserialization": true }
        }));
        assert!(!passed(&check_path_traversal(
            &BlockContext::new("python", "open('../../etc/passwd')"),
            &r,
            EnforcementLevel::Hard
        )));
        assert!(!passed(&check_unsafe_deserialization(
            &BlockContext::new("python", "pickle.loads(blob)"),
            &r,
            EnforcementLevel::Hard
        )));
    }

    #[test]
    fn test_urls_skip_local_and_allowlisted_hosts() {
        let r = rules(json!({
            "code_quality": {
                "no_hardcoded_urls": { "enabled": true, "allowlist": ["internal.corp"] }
            }
        }));
        let code = "a = 'http://localhost:8080'\nb = 'https://api.internal.corp/x'";
        assert!(passed(&check_hardcoded_urls(
            &BlockContext::new("python", code),
            &r,
            EnforcementLevel::Advisory,
        )));

        let code = "a = 'http://example.com'\nb = 'https://api.evil.io/v1'";
        let v = violated(check_hardcoded_urls(
            &BlockContext::new("python", code),
            &r,
            EnforcementLevel::Advisory,
        ));
        assert_eq!(v.notice.what, "Hardcoded URL: \"https://api.evil.io\"");
    }

    #[test]
    fn test_ips_exact_allowlist() {
        let r = rules(json!({ "code_quality": { "no_hardcoded_ips": true } }));
        assert!(passed(&check_hardcoded_ips(
            &BlockContext::new("python", "bind('127.0.0.1')"),
            &r,
            EnforcementLevel::Advisory
        )));
        let v = violated(check_hardcoded_ips(
            &BlockContext::new("python", "bind('127.0.0.1'); peer = '10.1.2.3'"),
            &r,
            EnforcementLevel::Advisory,
        ));
        assert_eq!(v.notice.what, "Hardcoded IP: \"10.1.2.3\"");
    }

    #[test]
    fn test_encoding() {
        let r = rules(json!({ "code_quality": { "encoding": true } }));
        let v = violated(check_encoding(
            &BlockContext::new("python", "a\0b"),
            &r,
            EnforcementLevel::Advisory,
        ));
        assert_eq!(v.notice.rule_path, "code_quality.encoding.block_null_bytes");
        let v = violated(check_encoding(
            &BlockContext::new("python", "x = 1 \u{202E} # hidden"),
            &r,
            EnforcementLevel::Advisory,
        ));
        assert_eq!(v.notice.rule_path, "code_quality.encoding.block_unicode_bidi");
        assert!(passed(&check_encoding(
            &BlockContext::new("python", "plain"),
            &r,
            EnforcementLevel::Advisory,
        )));
    }

    #[test]
    fn test_complexity_lines_and_nesting() {
        let r = rules(json!({
            "code_quality": {
                "max_complexity": {
                    "enabled": true, "max_lines_per_block": 3, "max_nesting_depth": 2
                }
            }
        }));
        let v = violated(check_complexity(
            &BlockContext::new("python", "a\nb\nc\nd"),
            &r,
            EnforcementLevel::Advisory,
        ));
        assert_eq!(v.notice.what, "Block has 4 lines (max: 3)");

        let v = violated(check_complexity(
            &BlockContext::new("javascript", "f(() => { if (x) { y(); } })"),
            &r,
            EnforcementLevel::Advisory,
        ));
        assert!(v.notice.what.starts_with("Block nests"));
    }

    #[test]
    fn test_nesting_depth() {
        assert_eq!(nesting_depth("a"), 0);
        assert_eq!(nesting_depth("if x:\n    if y:\n        z()"), 2);
        assert_eq!(nesting_depth("{[()]}"), 3);
    }
}
