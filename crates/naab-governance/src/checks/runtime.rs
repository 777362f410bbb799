//! Checks the host calls while a program runs: resource limits,
//! capabilities, polyglot output and rate limits. All are HARD.
//!
//! Limits within bounds return [`CheckOutcome::Skipped`] so hot paths do not
//! flood the result list; capability checks record a pass.

use super::{CheckOutcome, Violation};
use crate::enforcement::ViolationNotice;
use crate::rate_limit::RateKind;
use crate::rules::{EnforcementLevel, FilesystemMode, OutputFormat, RuleSet};

const HARD: EnforcementLevel = EnforcementLevel::Hard;

/// A countable runtime limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
    CallDepth,
    ArraySize,
    LoopIterations,
    PolyglotBlocks,
    StringLength,
    NestingDepth,
    OutputSize,
    DictSize,
}

impl LimitKind {
    pub const ALL: [LimitKind; 8] = [
        LimitKind::CallDepth,
        LimitKind::ArraySize,
        LimitKind::LoopIterations,
        LimitKind::PolyglotBlocks,
        LimitKind::StringLength,
        LimitKind::NestingDepth,
        LimitKind::OutputSize,
        LimitKind::DictSize,
    ];

    pub fn rule(self) -> &'static str {
        match self {
            LimitKind::CallDepth => "limits.call_depth",
            LimitKind::ArraySize => "limits.array_size",
            LimitKind::LoopIterations => "limits.execution.loop_iterations",
            LimitKind::PolyglotBlocks => "limits.execution.polyglot_blocks",
            LimitKind::StringLength => "limits.data.string_length",
            LimitKind::NestingDepth => "limits.data.nesting_depth",
            LimitKind::OutputSize => "limits.data.output_size",
            LimitKind::DictSize => "limits.data.dict_size",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LimitKind::CallDepth => "Call depth",
            LimitKind::ArraySize => "Array size",
            LimitKind::LoopIterations => "Loop iteration count",
            LimitKind::PolyglotBlocks => "Polyglot block count",
            LimitKind::StringLength => "String length",
            LimitKind::NestingDepth => "Nesting depth",
            LimitKind::OutputSize => "Output size",
            LimitKind::DictSize => "Dictionary size",
        }
    }

    fn help(self) -> &'static str {
        match self {
            LimitKind::CallDepth => {
                "Maximum function call depth exceeded\nThis usually indicates infinite recursion"
            }
            LimitKind::ArraySize => {
                "Maximum array size exceeded\nConsider processing data in smaller batches"
            }
            LimitKind::LoopIterations => "Maximum loop iterations exceeded",
            LimitKind::PolyglotBlocks => "Maximum polyglot block count exceeded",
            LimitKind::StringLength => "Maximum string length exceeded",
            LimitKind::NestingDepth => "Maximum data nesting depth exceeded",
            LimitKind::OutputSize => "Maximum output size exceeded",
            LimitKind::DictSize => "Maximum dictionary size exceeded",
        }
    }

    /// Configured ceiling; 0 means unlimited.
    pub fn limit(self, rules: &RuleSet) -> usize {
        let l = &rules.limits;
        match self {
            LimitKind::CallDepth => l.effective_call_depth(),
            LimitKind::ArraySize => l.effective_array_size(),
            LimitKind::LoopIterations => l.execution.loop_iterations,
            LimitKind::PolyglotBlocks => l.execution.polyglot_blocks,
            LimitKind::StringLength => l.data.string_length,
            LimitKind::NestingDepth => l.data.nesting_depth,
            LimitKind::OutputSize => l.data.output_size,
            LimitKind::DictSize => l.data.dict_size,
        }
    }
}

pub fn check_limit(rules: &RuleSet, kind: LimitKind, value: usize) -> CheckOutcome {
    let max = kind.limit(rules);
    if max == 0 || value <= max {
        return CheckOutcome::Skipped;
    }
    let notice = ViolationNotice::new(
        HARD,
        format!("{} {value} exceeds limit of {max}", kind.label()),
    )
    .rule_text(format!("{} = {max}", kind.rule()))
    .help(kind.help());
    CheckOutcome::violation(kind.rule(), notice)
}

pub fn check_network(rules: &RuleSet) -> CheckOutcome {
    const RULE: &str = "capabilities.network";
    if rules.capabilities.network.enabled {
        return CheckOutcome::pass(RULE, HARD);
    }
    let notice = ViolationNotice::new(HARD, "Network access is not allowed")
        .rule_text("capabilities.network = false")
        .help(
            "Network operations are disabled by governance\n\
             This prevents outbound connections from polyglot blocks",
        )
        .examples(
            "http.get(\"https://api.example.com\")",
            "let data = json.parse(file.read(\"cached_data.json\"))",
        );
    CheckOutcome::violation(RULE, notice)
}

/// Intent of a filesystem operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsAccess {
    Read,
    Write,
}

impl FsAccess {
    /// `"write"` is a write; anything else reads.
    pub fn parse(mode: &str) -> Self {
        if mode.eq_ignore_ascii_case("write") {
            FsAccess::Write
        } else {
            FsAccess::Read
        }
    }
}

pub fn check_filesystem(rules: &RuleSet, access: FsAccess) -> CheckOutcome {
    const RULE: &str = "capabilities.filesystem";
    let notice = match (rules.capabilities.filesystem.mode, access) {
        (FilesystemMode::None, _) => ViolationNotice::new(HARD, "Filesystem access is not allowed")
            .rule_text("capabilities.filesystem = \"none\"")
            .help("All filesystem operations are disabled by governance")
            .examples(
                "file.write(\"output.txt\", data)",
                "print(data)  // Use stdout instead",
            ),
        (FilesystemMode::Read, FsAccess::Write) => {
            ViolationNotice::new(HARD, "Filesystem write access is not allowed")
                .rule_text("capabilities.filesystem = \"read\"")
                .help("Only read operations are allowed\nWriting files is disabled by governance")
                .examples(
                    "file.write(\"output.txt\", data)",
                    "let data = file.read(\"input.txt\")",
                )
        }
        _ => return CheckOutcome::pass(RULE, HARD),
    };
    CheckOutcome::violation(RULE, notice)
}

pub fn check_shell(rules: &RuleSet) -> CheckOutcome {
    const RULE: &str = "capabilities.shell";
    if rules.capabilities.shell.enabled {
        return CheckOutcome::pass(RULE, HARD);
    }
    let notice = ViolationNotice::new(HARD, "Shell execution is not allowed")
        .rule_text("capabilities.shell = false")
        .help(
            "Shell/bash polyglot blocks are disabled by governance\n\
             Use NAAb stdlib or other allowed languages instead",
        )
        .examples("let result = <<shell\nls -la\n>>", "let files = file.list(\".\")");
    CheckOutcome::violation(RULE, notice)
}

/// Format, size and line-count rules for what a block printed.
pub fn check_polyglot_output(rules: &RuleSet, language: &str, output: &str) -> CheckOutcome {
    const RULE: &str = "restrictions.polyglot_output";

    let wants_json = rules.restrictions.polyglot_output.format == OutputFormat::Json
        || rules.polyglot.output.require_json_pipe;
    if wants_json && serde_json::from_str::<serde_json::Value>(output).is_err() {
        let notice = ViolationNotice::new(HARD, "Polyglot block must return valid JSON")
            .rule_text("restrictions.polyglot_output = \"json\"")
            .help(
                "All polyglot blocks must return valid JSON output\n\
                 Use json.dumps() or JSON.stringify() to format output",
            )
            .examples(
                "print(\"hello world\")",
                "import json\nprint(json.dumps({\"message\": \"hello world\"}))",
            );
        return CheckOutcome::violation(RULE, notice);
    }

    let max_size = rules.max_output_size_for_language(language);
    if max_size > 0 && output.len() > max_size {
        let notice = ViolationNotice::new(
            HARD,
            format!("Polyglot output size {} exceeds limit of {max_size}", output.len()),
        )
        .rule_text(format!("restrictions.polyglot_output.max_size = {max_size}"))
        .help("Return a summary or write large results to a file");
        return CheckOutcome::violation(RULE, notice);
    }

    let max_lines = rules.polyglot.output.max_output_lines;
    let lines = output.lines().count();
    if max_lines > 0 && lines > max_lines {
        let notice = ViolationNotice::new(
            HARD,
            format!("Polyglot output has {lines} lines (max: {max_lines})"),
        )
        .rule_text(format!("polyglot.output.max_output_lines = {max_lines}"))
        .help("Return a summary or write large results to a file");
        return CheckOutcome::violation(RULE, notice);
    }

    CheckOutcome::pass(RULE, HARD)
}

/// Violation for an operation refused by a rate limiter.
pub fn rate_violation(kind: RateKind, max: u32) -> Violation {
    let notice = ViolationNotice::new(
        HARD,
        format!("Rate limit exceeded: more than {max} {} per second", kind.label()),
    )
    .rule_text(format!("{} = {max}", kind.rule()))
    .help("Slow down or raise the limit in govern.json");
    Violation {
        rule: kind.rule().to_string(),
        notice,
    }
}
