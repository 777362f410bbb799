//! Incomplete-code detection: placeholder markers, canned results,
//! temporary and simulated code, mock data and apologetic comments.

use regex::RegexBuilder;

use super::{pattern_check, scan, BlockContext, CheckOutcome};
use crate::enforcement::{truncate_chars, ViolationNotice};
use crate::rules::{EnforcementLevel, RuleSet};

const PLACEHOLDER_MARKERS: &[&str] = &[
    "TODO",
    "FIXME",
    "STUB",
    "PLACEHOLDER",
    "XXX",
    "TBD",
    "HACK",
    "IMPLEMENT_ME",
    "RUNTIME_COMPUTED",
];

/// (pattern, description)
const HARDCODED_RESULT_PATTERNS: &[(&str, &str)] = &[
    (r"return\s+True\s*#", "Hardcoded return True with comment"),
    (r"return\s+False\s*#", "Hardcoded return False with comment"),
    (r"return\s+0\s*#", "Hardcoded return 0 with comment"),
    (r"return\s+None\s*#", "Hardcoded return None with comment"),
    (r"#\s*for now", "Temporary implementation marker (# for now)"),
    (r"#\s*simplified", "Simplified implementation marker"),
    (r"#\s*placeholder", "Placeholder implementation marker"),
    (r"#\s*stub", "Stub implementation marker"),
    (r"#\s*not implemented", "Not implemented marker"),
    (r"#\s*basic implementation", "Basic implementation marker"),
    (r"#\s*minimal", "Minimal implementation marker"),
];

const TEMP_PATTERNS: &[&str] = &[
    "# [Ff]or now",
    "# [Tt]emporary",
    "# [Qq]uick fix",
    "# [Ww]ill implement later",
    "# [Ss]implified",
    "# [Bb]asic implementation",
    "# [Mm]inimal implementation",
    "# [Ww]ill (?:replace|refactor|rewrite)",
    "# [Nn]eeds? (?:refactoring|improvement|work)",
    "# [Ss]kipping for now",
    "# [Dd]efer(?:red)?",
    "# [Pp]rototype",
    "# [Ww]orkaround",
    "# [Bb]andaid",
    "# [Bb]and-aid",
];

const SIMULATION_PATTERNS: &[&str] = &[
    r"[Ss]imulate[ds]?",
    r"[Mm]ock(?:ed|ing)?\s+(?:execution|data|response|result)",
    r"[Ww]ould\s+(?:\w+\s+)?in\s+production",
    r"[Rr]eplace\s+this\s+with",
    r"[Ff]ake\s+(?:data|response|result|output|implementation)",
    r"[Dd]ummy\s+(?:data|response|result|output|implementation)",
    r"[Ss]tub(?:bed)?\s+(?:out|implementation|response)",
];

const MOCK_PREFIXES: &[&str] = &["mock_", "fake_", "dummy_", "stub_", "sample_", "example_"];

const MOCK_LITERALS: &[&str] = &[
    r#"['"]foo['"]"#,
    r#"['"]bar['"]"#,
    r#"['"]baz['"]"#,
    r#"['"]lorem ipsum['"]"#,
    r#"['"]John Doe['"]"#,
    r#"['"]Jane Doe['"]"#,
    r#"['"]123 Main St['"]"#,
    r#"['"]test@test\.com['"]"#,
];

const APOLOGY_PATTERNS: &[&str] = &[
    r"[Ii]'?m\s+(?:very\s+)?sorry",
    r"[Ii]\s+apologize",
    r"[Mm]y\s+apologies",
    r"[Oo]ops!?",
    r"[Yy]ikes!?",
    r"[Uu]h\s+oh!?",
    r"[Ii]'?ll\s+fix\s+(?:it|this)\s+(?:immediately|right\s+away)",
    r"[Ii]\s+didn'?t\s+(?:check|verify|test)",
    r"[Ii]\s+should\s+have\s+(?:checked|verified|tested)",
];

/// The source line containing byte `offset`, trimmed and cut at 80 chars.
fn line_at(code: &str, offset: usize) -> String {
    let start = code[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = code[offset..].find('\n').map_or(code.len(), |i| offset + i);
    truncate_chars(code[start..end].trim_start_matches([' ', '\t']), 80)
}

pub fn check_placeholders(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "code_quality.no_placeholders";
    let cfg = &rules.code_quality.no_placeholders;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);

    let base: Vec<&str> = if cfg.markers.is_empty() {
        PLACEHOLDER_MARKERS.to_vec()
    } else {
        cfg.markers.iter().map(String::as_str).collect()
    };
    let markers = base
        .into_iter()
        .chain(cfg.custom_markers.iter().map(String::as_str));

    for marker in markers {
        let pattern = format!(r"\b{}\b", regex::escape(marker));
        let Ok(re) = RegexBuilder::new(&pattern)
            .case_insensitive(!cfg.case_sensitive)
            .build()
        else {
            continue;
        };
        if let Some(m) = re.find(ctx.code) {
            let notice = ViolationNotice::new(
                level,
                format!("Placeholder \"{marker}\" found in code"),
            )
            .at(ctx.location_with(&line_at(ctx.code, m.start())))
            .rule(RULE)
            .help(
                "Code must be complete; no placeholder markers allowed\n\
                 Implement the actual functionality instead of deferring",
            );
            return CheckOutcome::violation(RULE, notice);
        }
    }
    CheckOutcome::pass(RULE, level)
}

pub fn check_hardcoded_results(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "code_quality.no_hardcoded_results";
    let cfg = &rules.code_quality.no_hardcoded_results;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);

    let patterns: Vec<(&str, &str)> = if cfg.patterns.is_empty() {
        HARDCODED_RESULT_PATTERNS.to_vec()
    } else {
        cfg.patterns
            .iter()
            .map(|p| (p.as_str(), "Hardcoded result pattern"))
            .collect()
    };
    let patterns = patterns.into_iter().chain(
        cfg.custom_patterns
            .iter()
            .map(|p| (p.as_str(), "Hardcoded result pattern")),
    );

    for (pattern, description) in patterns {
        if let Some(found) = scan(ctx.code, &[pattern], !cfg.case_sensitive, &cfg.allowlist) {
            let notice = ViolationNotice::new(level, format!("Hardcoded result: {description}"))
                .at(ctx.location_with(&truncate_chars(&found, 60)))
                .rule(RULE)
                .help(
                    "Code must contain real logic, not hardcoded return values\n\
                     Implement actual validation/processing instead",
                )
                .examples(
                    "def validate(data):\n    return True  # for now",
                    "def validate(data):\n    if not isinstance(data, dict):\n        return False\n    return \"name\" in data and \"value\" in data",
                );
            return CheckOutcome::violation(RULE, notice);
        }
    }
    CheckOutcome::pass(RULE, level)
}

pub fn check_temporary_code(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    pattern_check(
        ctx,
        &rules.code_quality.no_temporary_code,
        "code_quality.no_temporary_code",
        default,
        TEMP_PATTERNS,
        |found| {
            ViolationNotice::new(default, format!("Temporary code marker: \"{found}\""))
                .help("Replace temporary code with production implementation")
        },
    )
}

pub fn check_simulation_markers(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    pattern_check(
        ctx,
        &rules.code_quality.no_simulation_markers,
        "code_quality.no_simulation_markers",
        default,
        SIMULATION_PATTERNS,
        |found| {
            ViolationNotice::new(default, format!("Simulation marker: \"{found}\""))
                .help("Replace simulated/mocked code with real implementation")
        },
    )
}

pub fn check_mock_data(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "code_quality.no_mock_data";
    let cfg = &rules.code_quality.no_mock_data;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);

    let prefixes: Vec<String> = if cfg.variable_prefixes.is_empty() {
        MOCK_PREFIXES
            .iter()
            .map(|p| format!(r"\b{p}\w+"))
            .collect()
    } else {
        cfg.variable_prefixes
            .iter()
            .map(|p| format!(r"\b{}\w+", regex::escape(p)))
            .collect()
    };
    if let Some(found) = scan(ctx.code, &prefixes, true, &[]) {
        let notice = ViolationNotice::new(level, format!("Mock data variable: \"{found}\""))
            .at(ctx.location())
            .rule(RULE)
            .help("Use real data sources instead of mock/fake data");
        return CheckOutcome::violation(RULE, notice);
    }

    let mut literals: Vec<String> = if cfg.literal_patterns.is_empty() {
        MOCK_LITERALS.iter().map(|s| s.to_string()).collect()
    } else {
        cfg.literal_patterns.clone()
    };
    literals.extend(cfg.custom_patterns.iter().cloned());
    if let Some(found) = scan(ctx.code, &literals, true, &[]) {
        let notice = ViolationNotice::new(level, format!("Mock literal: \"{found}\""))
            .at(ctx.location())
            .rule(RULE)
            .help("Replace placeholder literals with real data");
        return CheckOutcome::violation(RULE, notice);
    }
    CheckOutcome::pass(RULE, level)
}

pub fn check_apologetic_language(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    pattern_check(
        ctx,
        &rules.code_quality.no_apologetic_language,
        "code_quality.no_apologetic_language",
        default,
        APOLOGY_PATTERNS,
        |found| {
            ViolationNotice::new(default, format!("Apologetic language: \"{found}\"")).help(
                "LLM-generated code should not contain apologies or self-deprecation\n\
                 This indicates the code may not have been properly verified",
            )
        },
    )
}
