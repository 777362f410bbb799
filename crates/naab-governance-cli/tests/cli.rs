//! End-to-end runs of the `naab-govern` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::json;

fn naab_govern() -> Command {
    Command::new(env!("CARGO_BIN_EXE_naab-govern"))
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn project(dir: &Path, policy: serde_json::Value) -> PathBuf {
    fs::write(dir.join("govern.json"), serde_json::to_vec_pretty(&policy).unwrap()).unwrap();
    dir.join("govern.json")
}

fn block(dir: &Path, name: &str, code: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, code).unwrap();
    path
}

fn policy() -> serde_json::Value {
    json!({
        "mode": "enforce",
        "languages": { "allowed": ["python", "javascript"] },
        "code_quality": { "no_secrets": true, "no_placeholders": "soft" },
        "restrictions": { "dangerous_calls": true },
        "output": { "summary": { "enabled": false } },
        "audit": { "level": "full", "output_file": "audit/ledger.jsonl", "tamper_evidence": true }
    })
}

#[test]
fn test_check_clean_block_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path(), policy());
    let file = block(dir.path(), "ok.py", "print(sum([1, 2, 3]))\n");

    let out = naab_govern()
        .args(["check", "--language", "python"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).starts_with("ok: "));
    assert!(stdout(&out).contains("0 violation(s), not blocked"));
}

#[test]
fn test_check_blocked_block_fails() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path(), policy());
    let file = block(dir.path(), "bad.py", "result = eval(user_input)\n");

    let out = naab_govern()
        .args(["check", "--language", "python", "--line", "7"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.contains("Dangerous pattern in python block: eval() call"), "{err}");
    assert!(err.contains("[HARD-MANDATORY]"));
}

#[test]
fn test_override_flag_unblocks_soft_only() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path(), policy());
    let file = block(dir.path(), "todo.py", "# TODO tidy this\nprint(1)\n");

    let blocked = naab_govern()
        .args(["check", "--language", "python"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(!blocked.status.success());

    let overridden = naab_govern()
        .args(["check", "--language", "python", "--governance-override"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(overridden.status.success(), "stderr: {}", stderr(&overridden));
    assert!(stdout(&overridden).contains("1 violation(s), not blocked"));
}

#[test]
fn test_check_json_output() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path(), policy());
    let file = block(dir.path(), "blocked.rb", "puts 1\n");

    let out = naab_govern()
        .args(["check", "--language", "ruby", "--format", "json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(!out.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(doc["blocked"], true);
    assert_eq!(doc["language"], "ruby");
    assert_eq!(doc["evaluated"], json!(["languages"]));
    assert_eq!(doc["results"][0]["rule"], "languages.allowed");
    assert_eq!(doc["results"][0]["outcome"], "blocked");
}

#[test]
fn test_check_writes_reports_and_signed_ledger() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path(), policy());
    let file = block(dir.path(), "ok.js", "console.log(JSON.stringify({ a: 1 }));\n");
    let sarif = dir.path().join("out/report.sarif");

    let out = naab_govern()
        .args(["check", "--language", "javascript", "--key-env", "NAAB_CLI_TEST_KEY"])
        .arg(&file)
        .arg("--report-sarif")
        .arg(&sarif)
        .env("NAAB_CLI_TEST_KEY", "cli-secret")
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&sarif).unwrap()).unwrap();
    assert_eq!(report["version"], "2.1.0");

    let ledger = dir.path().join("audit/ledger.jsonl");
    let verified = naab_govern()
        .args(["verify-audit", "--key-env", "NAAB_CLI_TEST_KEY"])
        .arg(&ledger)
        .env("NAAB_CLI_TEST_KEY", "cli-secret")
        .output()
        .unwrap();
    assert!(verified.status.success(), "{}", stdout(&verified));
    assert!(stdout(&verified).contains("VALID"));

    let wrong_key = naab_govern()
        .args(["verify-audit", "--key-env", "NAAB_CLI_TEST_KEY", "--format", "json"])
        .arg(&ledger)
        .env("NAAB_CLI_TEST_KEY", "not-the-key")
        .output()
        .unwrap();
    assert!(!wrong_key.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&wrong_key.stdout).unwrap();
    assert_eq!(doc["is_valid"], false);
    assert!(!doc["invalid_signatures"].as_array().unwrap().is_empty());
}

#[test]
fn test_verify_audit_detects_tampering() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path(), policy());
    let file = block(dir.path(), "ok.py", "print(1)\n");
    for _ in 0..3 {
        let out = naab_govern()
            .args(["check", "--language", "python"])
            .arg(&file)
            .output()
            .unwrap();
        assert!(out.status.success());
    }

    let ledger = dir.path().join("audit/ledger.jsonl");
    let text = fs::read_to_string(&ledger).unwrap();
    fs::write(&ledger, text.replacen("\"languages\"", "\"languages.forged\"", 1)).unwrap();

    let out = naab_govern()
        .arg("verify-audit")
        .arg(&ledger)
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(stdout(&out).contains("INVALID"));
    assert!(stdout(&out).contains("Tampered: 0"));
}

#[test]
fn test_lint_strict_fails_on_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let path = project(dir.path(), json!({ "mode": "audit", "captabilities": {} }));

    let lenient = naab_govern()
        .args(["lint", "--policy"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(lenient.status.success());
    let text = stdout(&lenient);
    assert!(text.contains("mode audit"));
    assert!(text.contains("did you mean \"capabilities\""));

    let strict = naab_govern()
        .args(["lint", "--strict", "--policy"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(!strict.status.success());
}

#[test]
fn test_lint_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("govern.json");
    fs::write(&path, "{ \"mode\": ").unwrap();
    let out = naab_govern()
        .args(["lint", "--policy"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(stderr(&out).contains("failed to parse"));
}

#[test]
fn test_catalog_lists_checks_in_order() {
    let out = naab_govern().arg("catalog").output().unwrap();
    assert!(out.status.success());
    let text = stdout(&out);
    let first = text.lines().next().unwrap();
    assert!(first.contains("languages"));
    assert!(first.contains("hard"));
    assert!(text.lines().last().unwrap().contains("custom_rules"));
}
