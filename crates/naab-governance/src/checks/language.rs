//! Language-level checks: the allow/block lists and the per-language
//! overrides (imports, banned functions, style switches, block size).

use regex::RegexBuilder;

use super::{line_count, BlockContext, CheckOutcome};
use crate::enforcement::ViolationNotice;
use crate::rules::{EnforcementLevel, RuleSet};

fn block_example(language: &str) -> String {
    format!("let result = <<{language}\n...\n>>")
}

/// Always HARD; a language that passes records `languages`.
pub fn check_language_allowed(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    _default: EnforcementLevel,
) -> CheckOutcome {
    let lang = ctx.language;
    let location = ctx.location_with(&format!("<<{lang}"));
    let langs = &rules.languages;
    let first_allowed = langs.allowed.iter().next();

    if langs.blocked.contains(lang) {
        let notice = ViolationNotice::new(
            EnforcementLevel::Hard,
            format!("Language \"{lang}\" is blocked"),
        )
        .at(location)
        .rule_text(format!("languages.blocked contains \"{lang}\""))
        .help(format!(
            "The \"{lang}\" language is explicitly blocked in governance"
        ))
        .examples(
            block_example(lang),
            first_allowed.map(|l| block_example(l)).unwrap_or_default(),
        );
        return CheckOutcome::violation("languages.blocked", notice);
    }

    if let Some(first) = first_allowed {
        if !langs.allowed.contains(lang) {
            let list = langs
                .allowed
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            let notice = ViolationNotice::new(
                EnforcementLevel::Hard,
                format!("Language \"{lang}\" is not allowed"),
            )
            .at(location)
            .rule_text(format!("languages.allowed = [{list}]"))
            .help(format!(
                "Only {list} polyglot blocks are permitted\n\
                 To allow {lang}, add it to the \"allowed\" array in govern.json"
            ))
            .examples(block_example(lang), block_example(first));
            return CheckOutcome::violation("languages.allowed", notice);
        }
    }

    CheckOutcome::pass("languages", EnforcementLevel::Hard)
}

/// Import pattern for `module` in the syntax of `language`. The module name
/// is inserted as a regex fragment.
fn import_pattern(language: &str, module: &str) -> String {
    match language {
        "python" => format!(r"(?:import\s+{module}|from\s+{module})"),
        "javascript" => format!(
            r#"(?:require\s*\(\s*['"]{module}['"]|import.*from\s*['"]{module}['"])"#
        ),
        "go" => format!("\"{module}\""),
        "ruby" => format!(r#"require\s*['"]{module}['"]"#),
        _ => module.to_string(),
    }
}

fn matches_ci(pattern: &str, code: &str) -> bool {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(code))
        .unwrap_or(false)
}

pub fn check_imports(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    let cfg = &rules.restrictions.imports;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);
    let lang = ctx.language;

    let mut blocked: Vec<&String> = Vec::new();
    blocked.extend(cfg.blocked.get(lang).into_iter().flatten());
    blocked.extend(cfg.blocked.get("any").into_iter().flatten());
    if let Some(lc) = rules.language_config(lang) {
        blocked.extend(lc.imports.blocked.iter());
        blocked.extend(lc.banned_imports.iter());
    }

    for module in blocked {
        if matches_ci(&import_pattern(lang, module), ctx.code) {
            let notice = ViolationNotice::new(
                level,
                format!("Blocked import in {lang} block: \"{module}\""),
            )
            .at(ctx.location())
            .rule("restrictions.imports")
            .help(format!("The import \"{module}\" is blocked by governance"));
            return CheckOutcome::violation("restrictions.imports", notice);
        }
    }
    CheckOutcome::pass("restrictions.imports", level)
}

/// Banned functions and keywords are always HARD.
pub fn check_banned_functions(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    _default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "languages.per_language.banned_functions";
    let lang = ctx.language;
    let Some(lc) = rules.language_config(lang) else {
        return CheckOutcome::Skipped;
    };
    if lc.banned_functions.is_empty() && lc.banned_keywords.is_empty() {
        return CheckOutcome::Skipped;
    }

    let level = EnforcementLevel::Hard;
    for func in &lc.banned_functions {
        if matches_ci(func, ctx.code) {
            let notice = ViolationNotice::new(
                level,
                format!("Banned function in {lang} block: \"{func}\""),
            )
            .at(ctx.location())
            .rule_text(format!("languages.per_language.{lang}.banned_functions"))
            .help("This function is banned by governance policy");
            return CheckOutcome::violation(RULE, notice);
        }
    }
    for keyword in &lc.banned_keywords {
        let pattern = format!(r"\b{}\b", regex::escape(keyword));
        if matches_ci(&pattern, ctx.code) {
            let notice = ViolationNotice::new(
                level,
                format!("Banned keyword in {lang} block: \"{keyword}\""),
            )
            .at(ctx.location())
            .rule_text(format!("languages.per_language.{lang}.banned_keywords"))
            .help("This keyword is banned by governance policy");
            return CheckOutcome::violation(RULE, notice);
        }
    }
    CheckOutcome::pass(RULE, level)
}

/// `require_set_e` for shell blocks and `no_var` for JavaScript.
pub fn check_style(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    let lang = ctx.language;
    let Some(lc) = rules.language_config(lang) else {
        return CheckOutcome::Skipped;
    };

    if matches!(lang, "shell" | "bash") && lc.require_set_e.enabled {
        const RULE: &str = "languages.per_language.shell.require_set_e";
        let level = lc.require_set_e.level.unwrap_or(default);
        if !ctx.code.contains("set -e") {
            let notice = ViolationNotice::new(level, "Shell block missing 'set -e'")
                .at(ctx.location())
                .rule(RULE)
                .help("Add 'set -e' to exit on errors")
                .examples("echo \"hello\"", "set -e\necho \"hello\"");
            return CheckOutcome::violation(RULE, notice);
        }
        return CheckOutcome::pass(RULE, level);
    }

    if lang == "javascript" && lc.no_var.enabled {
        const RULE: &str = "languages.per_language.javascript.no_var";
        let level = lc.no_var.level.unwrap_or(EnforcementLevel::Advisory);
        let uses_var = regex::Regex::new(r"\bvar\s+\w")
            .map(|re| re.is_match(ctx.code))
            .unwrap_or(false);
        if uses_var {
            let notice = ViolationNotice::new(level, "Use 'let' or 'const' instead of 'var'")
                .at(ctx.location())
                .rule(RULE)
                .help("'var' has function scope; use 'let' or 'const' for block scope")
                .examples("var x = 1;", "let x = 1;  // or const x = 1;");
            return CheckOutcome::violation(RULE, notice);
        }
        return CheckOutcome::pass(RULE, level);
    }

    CheckOutcome::Skipped
}

/// Per-language `max_lines`, always HARD.
pub fn check_code_size(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    _default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "languages.per_language.max_lines";
    let lang = ctx.language;
    let max = match rules.language_config(lang) {
        Some(lc) if lc.max_lines > 0 => lc.max_lines,
        _ => return CheckOutcome::Skipped,
    };
    let lines = line_count(ctx.code);
    if lines > max {
        let notice = ViolationNotice::new(
            EnforcementLevel::Hard,
            format!("{lang} block has {lines} lines (max: {max})"),
        )
        .at(ctx.location())
        .rule_text(format!("languages.per_language.{lang}.max_lines = {max}"))
        .help("Break large blocks into smaller functions");
        return CheckOutcome::violation(RULE, notice);
    }
    CheckOutcome::pass(RULE, EnforcementLevel::Hard)
}
