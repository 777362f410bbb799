//! Reports written at the end of a session, relative to the policy file.

use std::fs;

use naab_governance::report::render_csv;
use naab_governance::{Governance, ReportFormat, RuleStore};
use serde_json::json;

#[test]
fn test_session_writes_configured_reports() {
    let dir = tempfile::tempdir().unwrap();
    let policy = dir.path().join("govern.json");
    fs::write(
        &policy,
        json!({
            "mode": "enforce",
            "code_quality": { "no_placeholders": "advisory" },
            "restrictions": { "dangerous_calls": true },
            "audit": { "level": "none" },
            "output": {
                "file_output": {
                    "report_json": "reports/governance.json",
                    "report_sarif": "reports/governance.sarif",
                    "report_junit": "reports/junit.xml"
                }
            }
        })
        .to_string(),
    )
    .unwrap();

    let loaded = RuleStore::load(&policy).unwrap();
    let gov = Governance::from_policy(&loaded, None).quiet();
    let blocked = gov.check_polyglot_block(
        "python",
        "# TODO later\nexec(payload)\n",
        "job.naab",
        2,
    );
    assert!(blocked.is_some());

    let written = gov.write_reports().unwrap();
    assert_eq!(written.len(), 3);

    let json: serde_json::Value =
        serde_json::from_str(
            &fs::read_to_string(dir.path().join("reports/governance.json")).unwrap(),
        )
        .unwrap();
    assert_eq!(json["mode"], "enforce");
    let rules: Vec<&str> = json["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["rule"].as_str().unwrap())
        .collect();
    assert_eq!(
        rules,
        vec![
            "languages",
            "code_quality.no_placeholders",
            "restrictions.dangerous_calls"
        ]
    );

    let sarif: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("reports/governance.sarif")).unwrap(),
    )
    .unwrap();
    let results = sarif["runs"][0]["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["level"], "warning");
    assert_eq!(results[1]["ruleId"], "restrictions.dangerous_calls");
    assert_eq!(results[1]["level"], "error");

    let junit = fs::read_to_string(dir.path().join("reports/junit.xml")).unwrap();
    assert!(junit.contains("tests=\"3\" failures=\"1\""));

    assert!(!dir.path().join("reports/governance.csv").exists());
}

#[test]
fn test_every_format_lists_each_result_once() {
    let gov = Governance::new(
        serde_json::from_value(json!({ "capabilities": { "network": false } })).unwrap(),
    )
    .quiet();
    gov.check_network_allowed();
    gov.check_shell_allowed();
    let results = gov.results();
    assert_eq!(results.len(), 2);

    // SARIF carries failures only.
    for format in ReportFormat::ALL {
        let text = format.render(gov.rules().mode, &results);
        let expected = usize::from(format != ReportFormat::Sarif);
        assert_eq!(
            text.matches("capabilities.shell").count(),
            expected,
            "{} report",
            format.as_str()
        );
    }
    assert_eq!(render_csv(&results).lines().count(), 3);
}
