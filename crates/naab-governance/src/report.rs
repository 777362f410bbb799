//! Report rendering for CI and external tooling.
//!
//! Every renderer is a pure function of the governance mode and the
//! recorded results. Each result appears exactly once per format, except
//! SARIF which lists failures only.
//! [`write_reports`] writes whichever paths `output.file_output` configures.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use crate::enforcement::CheckResult;
use crate::obs;
use crate::rules::{EnforcementLevel, FileOutput, GovernanceMode};

pub const REPORT_VERSION: &str = "3.0";
pub const TOOL_NAME: &str = "NAAb Governance Engine";
const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    Json,
    Sarif,
    Junit,
    Csv,
    Html,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 5] = [
        ReportFormat::Json,
        ReportFormat::Sarif,
        ReportFormat::Junit,
        ReportFormat::Csv,
        ReportFormat::Html,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Sarif => "sarif",
            ReportFormat::Junit => "junit",
            ReportFormat::Csv => "csv",
            ReportFormat::Html => "html",
        }
    }

    /// Where `output.file_output` wants this format written, if anywhere.
    pub fn configured_path(self, out: &FileOutput) -> Option<&Path> {
        let path = match self {
            ReportFormat::Json => &out.report_json,
            ReportFormat::Sarif => &out.report_sarif,
            ReportFormat::Junit => &out.report_junit,
            ReportFormat::Csv => &out.report_csv,
            ReportFormat::Html => &out.report_html,
        };
        path.as_deref().filter(|p| !p.as_os_str().is_empty())
    }

    pub fn render(self, mode: GovernanceMode, results: &[CheckResult]) -> String {
        match self {
            ReportFormat::Json => render_json(mode, results),
            ReportFormat::Sarif => render_sarif(results),
            ReportFormat::Junit => render_junit(results),
            ReportFormat::Csv => render_csv(results),
            ReportFormat::Html => render_html(results),
        }
    }
}

fn first_line(message: Option<&str>) -> &str {
    message.and_then(|m| m.lines().next()).unwrap_or_default()
}

#[derive(Serialize)]
struct JsonResult<'a> {
    rule: &'a str,
    level: EnforcementLevel,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

pub fn render_json(mode: GovernanceMode, results: &[CheckResult]) -> String {
    let results: Vec<JsonResult<'_>> = results
        .iter()
        .map(|r| JsonResult {
            rule: &r.rule,
            level: r.level,
            passed: r.passed,
            message: r.message.as_deref().filter(|m| !m.is_empty()),
        })
        .collect();
    let report = json!({
        "version": REPORT_VERSION,
        "mode": mode,
        "results": results,
    });
    serde_json::to_string_pretty(&report).unwrap_or_default()
}

/// SARIF 2.1.0 with one run; only failures become results.
pub fn render_sarif(results: &[CheckResult]) -> String {
    let sarif_results: Vec<_> = results
        .iter()
        .filter(|r| !r.passed)
        .map(|r| {
            let text = match first_line(r.message.as_deref()) {
                "" => r.rule.as_str(),
                line => line,
            };
            json!({
                "ruleId": r.rule,
                "level": if r.level == EnforcementLevel::Advisory { "warning" } else { "error" },
                "message": { "text": text },
            })
        })
        .collect();
    let sarif = json!({
        "version": "2.1.0",
        "$schema": SARIF_SCHEMA,
        "runs": [{
            "tool": { "driver": { "name": TOOL_NAME, "version": REPORT_VERSION } },
            "results": sarif_results,
        }],
    });
    serde_json::to_string_pretty(&sarif).unwrap_or_default()
}

pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// `failures` counts non-advisory failures; advisory failures still get a
/// `<failure>` element.
pub fn render_junit(results: &[CheckResult]) -> String {
    let failures = results
        .iter()
        .filter(|r| !r.passed && r.level != EnforcementLevel::Advisory)
        .count();
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        out,
        "<testsuite name=\"NAAb Governance\" tests=\"{}\" failures=\"{failures}\">",
        results.len()
    );
    for r in results {
        let name = xml_escape(&r.rule);
        if r.passed {
            let _ = writeln!(out, "  <testcase name=\"{name}\"/>");
            continue;
        }
        let body = match first_line(r.message.as_deref()) {
            "" => name.clone(),
            line => xml_escape(line),
        };
        let _ = writeln!(out, "  <testcase name=\"{name}\">");
        let _ = writeln!(out, "    <failure type=\"{}\">{body}</failure>", r.level);
        let _ = writeln!(out, "  </testcase>");
    }
    out.push_str("</testsuite>\n");
    out
}

fn csv_field(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub fn render_csv(results: &[CheckResult]) -> String {
    let mut out = String::from("rule,level,passed,message\n");
    for r in results {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            csv_field(&r.rule),
            r.level,
            r.passed,
            csv_field(first_line(r.message.as_deref()))
        );
    }
    out
}

pub fn render_html(results: &[CheckResult]) -> String {
    let mut out = String::from(
        "<html><head><title>NAAb Governance Report</title></head><body>\n\
         <h1>NAAb Governance Report</h1>\n<table border='1'>\n\
         <tr><th>Rule</th><th>Level</th><th>Status</th></tr>\n",
    );
    for r in results {
        let (color, status) = match (r.passed, r.level) {
            (true, _) => ("green", "PASS"),
            (false, EnforcementLevel::Advisory) => ("orange", "FAIL"),
            (false, _) => ("red", "FAIL"),
        };
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td style='color:{color}'>{status}</td></tr>",
            xml_escape(&r.rule),
            r.level
        );
    }
    out.push_str("</table></body></html>\n");
    out
}

/// Write every configured report. Relative paths resolve against
/// `base_dir`. Returns the paths written.
pub fn write_reports(
    out: &FileOutput,
    base_dir: &Path,
    mode: GovernanceMode,
    results: &[CheckResult],
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for format in ReportFormat::ALL {
        let Some(path) = format.configured_path(out) else {
            continue;
        };
        let path = base_dir.join(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create report directory {}", parent.display()))?;
        }
        std::fs::write(&path, format.render(mode, results))
            .with_context(|| format!("write {} report to {}", format.as_str(), path.display()))?;
        obs::emit_report_written(format.as_str(), &path);
        written.push(path);
    }
    Ok(written)
}
