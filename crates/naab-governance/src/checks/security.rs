//! Security restrictions: dangerous calls, injection, privilege
//! escalation, exfiltration, resource abuse, information disclosure and
//! weak cryptography.

use regex::RegexBuilder;

use super::{effective_patterns, pattern_check, scan, BlockContext, CheckOutcome};
use crate::enforcement::ViolationNotice;
use crate::rules::{EnforcementLevel, RuleSet};

struct DangerousPattern {
    /// Language tag, or `any`.
    language: &'static str,
    pattern: &'static str,
    description: &'static str,
    alternative: &'static str,
    /// A match containing this text is not dangerous.
    unless: Option<&'static str>,
}

const fn dangerous(
    language: &'static str,
    pattern: &'static str,
    description: &'static str,
    alternative: &'static str,
) -> DangerousPattern {
    DangerousPattern {
        language,
        pattern,
        description,
        alternative,
        unless: None,
    }
}

const DANGEROUS_PATTERNS: &[DangerousPattern] = &[
    dangerous(
        "python",
        r"os\.system\s*\(",
        "os.system() call",
        "Use subprocess.run() with shell=False, or NAAb stdlib",
    ),
    dangerous(
        "python",
        r"subprocess\.call\s*\(.*shell\s*=\s*True",
        "subprocess.call() with shell=True",
        "Use subprocess.run() with shell=False",
    ),
    dangerous(
        "python",
        r"\beval\s*\(",
        "eval() call",
        "Use json.loads() for data parsing, ast.literal_eval() for literals",
    ),
    dangerous(
        "python",
        r"\bexec\s*\(",
        "exec() call",
        "Restructure code to avoid dynamic execution",
    ),
    dangerous("python", r"__import__\s*\(", "__import__() call", "Use standard import statements"),
    dangerous(
        "python",
        r"pickle\.loads?\s*\(",
        "pickle.load() call",
        "Use json.loads(); pickle can execute arbitrary code",
    ),
    DangerousPattern {
        language: "python",
        pattern: r"yaml\.load\s*\([^)]*\)?",
        description: "yaml.load() without SafeLoader",
        alternative: "Use yaml.safe_load() instead",
        unless: Some("Loader"),
    },
    dangerous("javascript", r"\beval\s*\(", "eval() call", "Parse data with JSON.parse() instead"),
    dangerous(
        "javascript",
        r"\bFunction\s*\(",
        "Function() constructor",
        "Define functions statically",
    ),
    dangerous(
        "javascript",
        r#"require\s*\(\s*['"]child_process['"]\s*\)"#,
        "child_process import",
        "Use NAAb stdlib for subprocess execution",
    ),
    dangerous(
        "shell",
        r"rm\s+-rf\s+/",
        "rm -rf / (recursive root delete)",
        "Specify exact paths, never recursive from root",
    ),
    dangerous(
        "shell",
        r"\bdd\s+if=",
        "dd command (disk destroyer)",
        "Use NAAb file module for safe file operations",
    ),
    dangerous(
        "shell",
        r"\bmkfs\.",
        "mkfs (format filesystem)",
        "Extremely dangerous; do not format filesystems in polyglot blocks",
    ),
    dangerous("shell", r">\s*/dev/", "Writing to device files", "Avoid writing to device files"),
    dangerous(
        "shell",
        r"chmod\s+777",
        "chmod 777 (world-writable)",
        "Use specific permissions (644 for files, 755 for executables)",
    ),
    dangerous(
        "shell",
        r"curl.*\|\s*sh",
        "curl | sh (remote code execution)",
        "Download and inspect scripts before executing",
    ),
    dangerous(
        "shell",
        r"wget.*\|\s*sh",
        "wget | sh (remote code execution)",
        "Download and inspect scripts before executing",
    ),
    dangerous(
        "any",
        r"\bsudo\s",
        "sudo (privilege escalation)",
        "Avoid privilege escalation in polyglot blocks",
    ),
];

const SHELL_INJECTION_PATTERNS: &[&str] = &[
    r"curl.*\|\s*sh",
    r"wget.*\|\s*bash",
    r"eval\s+\$",
    r"\$\(curl",
    r"\$\(wget",
    r"bash\s+-c.*\$",
    r"chmod\s+777",
    r"chmod\s+\+x.*\$",
];

/// `shell` and `bash` share the shell table.
fn dangerous_applies(entry_language: &str, language: &str) -> bool {
    entry_language == "any"
        || entry_language == language
        || (entry_language == "shell" && language == "bash")
}

pub fn check_dangerous_calls(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "restrictions.dangerous_calls";
    let cfg = &rules.restrictions.dangerous_calls;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);
    let lang = ctx.language;
    let location = ctx.location_with(&format!("{lang} block"));

    for entry in DANGEROUS_PATTERNS.iter().filter(|e| dangerous_applies(e.language, lang)) {
        let Ok(re) = RegexBuilder::new(entry.pattern).case_insensitive(true).build() else {
            continue;
        };
        let hit = re.find_iter(ctx.code).any(|m| {
            let text = m.as_str();
            entry.unless.map_or(true, |u| !text.contains(u))
                && !cfg.allowlist.iter().any(|a| text.contains(a.as_str()))
        });
        if hit {
            let notice = ViolationNotice::new(
                level,
                format!("Dangerous pattern in {lang} block: {}", entry.description),
            )
            .at(location)
            .rule(RULE)
            .help(format!("{}\n{}", entry.description, entry.alternative));
            return CheckOutcome::violation(RULE, notice);
        }
    }

    let extra = effective_patterns(cfg, &[]);
    if let Some(found) = scan(ctx.code, &extra, !cfg.case_sensitive, &cfg.allowlist) {
        let notice = ViolationNotice::new(
            level,
            format!("Dangerous pattern in {lang} block: \"{found}\""),
        )
        .at(location)
        .rule(RULE)
        .help("This call is restricted by governance policy");
        return CheckOutcome::violation(RULE, notice);
    }
    CheckOutcome::pass(RULE, level)
}

pub fn check_shell_injection(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    pattern_check(
        ctx,
        &rules.restrictions.shell_injection,
        "restrictions.shell_injection",
        default,
        SHELL_INJECTION_PATTERNS,
        |found| {
            ViolationNotice::new(default, format!("Shell injection pattern: \"{found}\""))
                .help("Avoid piping untrusted input to shell execution")
        },
    )
}

/// Shared shape of the flag-driven restriction checks.
fn restriction(
    ctx: &BlockContext<'_>,
    rule: &str,
    level: EnforcementLevel,
    patterns: &[String],
    what: impl FnOnce(&str) -> String,
    help: &str,
) -> CheckOutcome {
    match scan(ctx.code, patterns, true, &[]) {
        Some(found) => {
            let notice = ViolationNotice::new(level, what(&found))
                .at(ctx.location())
                .rule(rule)
                .help(help);
            CheckOutcome::violation(rule, notice)
        }
        None => CheckOutcome::pass(rule, level),
    }
}

fn owned<'a>(patterns: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
    patterns.iter().map(|p| p.to_string())
}

pub fn check_code_injection(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    let cfg = &rules.restrictions.code_injection;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let mut patterns = Vec::new();
    if cfg.block_dynamic_code_gen {
        patterns.extend(owned(&[r"\beval\s*\(", r"\bexec\s*\(", r"\bFunction\s*\("]));
    }
    if cfg.block_sql_injection_patterns {
        patterns.extend(owned(&[
            r#"(?:SELECT|INSERT|UPDATE|DELETE)\s+.*['"]\s*\+"#,
            r#"f['"].*(?:SELECT|INSERT|UPDATE|DELETE).*\{"#,
        ]));
    }
    if cfg.block_command_injection {
        patterns.extend(owned(&[r"os\.system\s*\(", r"subprocess\.call.*shell\s*=\s*True"]));
    }
    let lang = ctx.language;
    restriction(
        ctx,
        "restrictions.code_injection",
        cfg.level.unwrap_or(default),
        &patterns,
        |found| format!("Code injection pattern in {lang} block: \"{found}\""),
        "Avoid dynamic code execution and use safe alternatives",
    )
}

pub fn check_privilege_escalation(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    let cfg = &rules.restrictions.privilege_escalation;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let mut patterns = Vec::new();
    if cfg.block_sudo {
        patterns.push(r"\bsudo\s".to_string());
    }
    if cfg.block_su {
        patterns.push(r"\bsu\s+-".to_string());
    }
    if cfg.block_chmod_suid {
        patterns.push(r"chmod\s+[ugo]*\+?s".to_string());
    }
    if cfg.block_setuid {
        patterns.push(r"\bsetuid\b".to_string());
    }
    restriction(
        ctx,
        "restrictions.privilege_escalation",
        cfg.level.unwrap_or(default),
        &patterns,
        |found| format!("Privilege escalation: \"{found}\""),
        "Avoid privilege escalation in polyglot blocks",
    )
}

pub fn check_data_exfiltration(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    let cfg = &rules.restrictions.data_exfiltration;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let mut patterns = Vec::new();
    if cfg.block_base64_encode_secrets {
        patterns.push(r"base64\.(?:b64encode|encode).*(?:password|secret|key|token)".to_string());
    }
    if cfg.block_hex_encode_secrets {
        patterns.push(r"\.hex\(\).*(?:password|secret|key|token)".to_string());
    }
    if cfg.block_dns_exfiltration {
        patterns.extend(owned(&[
            r"(?:nslookup|dig)\s+\S*\$\{?\w+",
            r"gethostbyname\([^)]*\+",
        ]));
    }
    restriction(
        ctx,
        "restrictions.data_exfiltration",
        cfg.level.unwrap_or(default),
        &patterns,
        |_| "Potential data exfiltration pattern detected".to_string(),
        "Do not encode secrets for transmission",
    )
}

pub fn check_resource_abuse(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    let cfg = &rules.restrictions.resource_abuse;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let mut patterns = Vec::new();
    if cfg.block_fork_bomb {
        patterns.extend(owned(&[r":\(\)\s*\{\s*:\|:&\s*\};:", r"fork\(\).*fork\(\)"]));
    }
    if cfg.block_disk_filling {
        patterns.push(r"dd\s+if=/dev/zero".to_string());
    }
    if cfg.block_infinite_loops {
        patterns.extend(owned(&[
            r"while\s+True\s*:\s*pass",
            r"while\s*\(\s*true\s*\)\s*\{\s*\}",
            r"for\s*\(\s*;\s*;\s*\)\s*\{\s*\}",
        ]));
    }
    restriction(
        ctx,
        "restrictions.resource_abuse",
        cfg.level.unwrap_or(default),
        &patterns,
        |found| format!("Resource abuse pattern: \"{found}\""),
        "This pattern could cause resource exhaustion",
    )
}

/// First match of `pattern` whose next character is not `forbidden`.
fn find_not_followed_by(code: &str, pattern: &str, forbidden: char) -> Option<String> {
    let re = RegexBuilder::new(pattern).case_insensitive(true).build().ok()?;
    let found = re
        .find_iter(code)
        .find(|m| !code[m.end()..].starts_with(forbidden))
        .map(|m| m.as_str().to_string());
    found
}

pub fn check_information_disclosure(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "restrictions.information_disclosure";
    let cfg = &rules.restrictions.information_disclosure;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);

    let mut found = None;
    if cfg.block_env_dump {
        // Whole-environment access; indexing a single variable is fine.
        found = [(r"os\.environ", '['), (r"process\.env", '.'), (r"\benv\b", '.')]
            .iter()
            .find_map(|(p, next)| find_not_followed_by(ctx.code, p, *next));
    }
    let mut patterns = Vec::new();
    if cfg.block_process_listing {
        patterns.extend(owned(&[r"ps\s+aux", r"ps\s+-ef"]));
    }
    if cfg.block_system_info_leak {
        patterns.extend(owned(&[r"uname\s+-a", r"cat\s+/etc/passwd"]));
    }
    if found.is_none() {
        found = scan(ctx.code, &patterns, true, &[]);
    }

    match found {
        Some(found) => {
            let notice = ViolationNotice::new(
                level,
                format!("Information disclosure pattern: \"{found}\""),
            )
            .at(ctx.location())
            .rule(RULE)
            .help("Avoid leaking system/environment information");
            CheckOutcome::violation(RULE, notice)
        }
        None => CheckOutcome::pass(RULE, level),
    }
}

pub fn check_crypto(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    let cfg = &rules.restrictions.crypto;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let mut patterns = Vec::new();
    if cfg.block_weak_hashing {
        for hash in &cfg.weak_hashes {
            let h = regex::escape(hash);
            patterns.push(format!(r"\b{h}\b"));
            patterns.push(format!(r"hashlib\.{h}"));
        }
    }
    if cfg.block_weak_encryption {
        patterns.extend(cfg.weak_ciphers.iter().map(|c| format!(r"\b{}\b", regex::escape(c))));
    }
    if cfg.block_hardcoded_keys {
        patterns.push(r#"(?:encryption|signing|crypto)_key\s*=\s*['"][^'"]+['"]"#.to_string());
    }
    restriction(
        ctx,
        "restrictions.crypto",
        cfg.level.unwrap_or(default),
        &patterns,
        |found| format!("Cryptographic weakness: \"{found}\""),
        "Use strong cryptographic algorithms (SHA-256+, AES-256)",
    )
}
