//! Violation notices: the multi-line message shown when a check fails.

use std::fmt::Write as _;

use crate::rules::{EnforcementLevel, ErrorOutput};

/// Structured pieces of a violation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationNotice {
    pub level: EnforcementLevel,
    pub what: String,
    pub location: String,
    pub rule_path: String,
    pub help: String,
    pub bad_example: String,
    pub good_example: String,
}

impl ViolationNotice {
    pub fn new(level: EnforcementLevel, what: impl Into<String>) -> Self {
        Self {
            level,
            what: what.into(),
            location: String::new(),
            rule_path: String::new(),
            help: String::new(),
            bad_example: String::new(),
            good_example: String::new(),
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// `rule_path` is the dotted config key, shown with the active level.
    pub fn rule(mut self, rule_path: impl Into<String>) -> Self {
        self.rule_path = format!("{} = \"{}\"", rule_path.into(), self.level);
        self
    }

    /// Rule line shown verbatim.
    pub fn rule_text(mut self, text: impl Into<String>) -> Self {
        self.rule_path = text.into();
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn examples(mut self, bad: impl Into<String>, good: impl Into<String>) -> Self {
        self.bad_example = bad.into();
        self.good_example = good.into();
        self
    }

    /// Render with every section enabled.
    pub fn render_default(&self) -> String {
        self.render(&ErrorOutput::default())
    }

    pub fn render(&self, opts: &ErrorOutput) -> String {
        let mut out = String::new();
        let kind = if self.level == EnforcementLevel::Advisory {
            "warning"
        } else {
            "error"
        };
        let _ = write!(out, "Governance {kind}: {} [{}]\n\n", self.what, self.level.tag());

        if !self.location.is_empty() {
            let _ = writeln!(out, "  At: {}", self.location);
        }
        if !self.rule_path.is_empty() {
            let _ = writeln!(out, "  Rule (govern.json): {}", self.rule_path);
        }
        out.push('\n');

        if opts.show_help && !self.help.is_empty() {
            out.push_str("  Help:\n");
            for line in self.help.lines() {
                let _ = writeln!(out, "  - {line}");
            }
            out.push('\n');
        }

        if opts.show_examples && (!self.bad_example.is_empty() || !self.good_example.is_empty()) {
            out.push_str("  Example:\n");
            if !self.bad_example.is_empty() {
                out.push_str("    \u{2717} Blocked:\n");
                for line in self.bad_example.lines() {
                    let _ = writeln!(out, "      {line}");
                }
            }
            if !self.good_example.is_empty() {
                out.push_str("    \u{2713} Allowed:\n");
                for line in self.good_example.lines() {
                    let _ = writeln!(out, "      {line}");
                }
            }
        }

        match self.level {
            EnforcementLevel::Soft => {
                out.push_str("\n  To override: run with --governance-override\n");
                out.push_str("  Note: Override will be logged to the audit trail\n");
            }
            EnforcementLevel::Advisory => {
                out.push_str("\n  Note: This is an advisory warning; execution will continue\n");
            }
            EnforcementLevel::Hard => {}
        }
        out
    }
}

/// Truncate to `max` characters, appending `...` when cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Keep the first and last four characters of long secrets.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
    } else {
        "*".repeat(chars.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_notice_layout() {
        let msg = ViolationNotice::new(EnforcementLevel::Hard, "Secret detected: API key")
            .at("line 4: sk-a****aaaa")
            .rule("code_quality.no_secrets")
            .help("Never hardcode secrets\nUse environment variables instead")
            .examples("key = \"sk-...\"", "key = os.environ[\"KEY\"]")
            .render_default();

        assert!(msg.starts_with("Governance error: Secret detected: API key [HARD-MANDATORY]\n\n"));
        assert!(msg.contains("  At: line 4: sk-a****aaaa\n"));
        assert!(msg.contains("  Rule (govern.json): code_quality.no_secrets = \"hard\"\n"));
        assert!(msg.contains("  - Use environment variables instead\n"));
        assert!(msg.contains("    \u{2717} Blocked:\n      key = \"sk-...\"\n"));
        assert!(!msg.contains("To override"));
    }

    #[test]
    fn test_soft_notice_mentions_override() {
        let msg = ViolationNotice::new(EnforcementLevel::Soft, "Placeholder").render_default();
        assert!(msg.contains("[SOFT-MANDATORY]"));
        assert!(msg.contains("--governance-override"));
    }

    #[test]
    fn test_advisory_is_warning() {
        let msg = ViolationNotice::new(EnforcementLevel::Advisory, "Debug output").render_default();
        assert!(msg.starts_with("Governance warning:"));
        assert!(msg.contains("execution will continue"));
    }

    #[test]
    fn test_output_options_hide_sections() {
        let notice = ViolationNotice::new(EnforcementLevel::Hard, "x")
            .help("h")
            .examples("b", "g");
        let msg = notice.render(&ErrorOutput {
            show_help: false,
            show_examples: false,
        });
        assert!(!msg.contains("Help:"));
        assert!(!msg.contains("Example:"));
    }

    #[test]
    fn test_mask_secret() {
        let key = format!("sk-{}", "a".repeat(32));
        let masked = mask_secret(&key);
        assert!(masked.starts_with("sk-a*"));
        assert!(masked.ends_with("*aaaa"));
        assert_eq!(masked.chars().count(), key.len());
        assert_eq!(mask_secret("short"), "*****");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("\u{e9}\u{e9}\u{e9}\u{e9}", 2), "\u{e9}\u{e9}...");
    }
}
