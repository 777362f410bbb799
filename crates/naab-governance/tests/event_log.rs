//! Plain JSONL event log and the policy-driven audit sink.

use std::fs;

use naab_governance::audit::event_log::rotated_path;
use naab_governance::{
    open_audit_sink, verify_ledger, AuditEvent, AuditMetadata, EventLog, Governance, RotationPolicy,
    RuleSet, RuleStore,
};
use serde_json::json;

#[test]
fn test_records_round_trip_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::open(
        dir.path().join("logs/audit.jsonl"),
        RotationPolicy::default(),
    )
    .unwrap();

    let mut metadata = AuditMetadata::new();
    metadata.insert("block_id".into(), "BLOCK-1".into());
    log.log(AuditEvent::BlockLoad, "loaded", &metadata).unwrap();
    log.log_security_violation("attempted write to /etc").unwrap();

    let records = log.read_all().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].event, AuditEvent::BlockLoad);
    assert_eq!(records[0].metadata["block_id"], "BLOCK-1");
    assert_eq!(records[1].event, AuditEvent::SecurityViolation);

    let raw = fs::read_to_string(log.path()).unwrap();
    assert!(raw.lines().nth(1).unwrap().contains("\"event\":\"SECURITY_VIOLATION\""));
}

#[test]
fn test_rotation_keeps_bounded_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let log = EventLog::open(
        &path,
        RotationPolicy {
            max_bytes: 1,
            keep: 2,
        },
    )
    .unwrap();

    for i in 0..4 {
        log.log(AuditEvent::BlockExecute, &format!("run {i}"), &AuditMetadata::new())
            .unwrap();
    }

    // Every write after the first rotates, so only the newest record is live.
    let live = log.read_all().unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].details, "run 3");
    assert!(rotated_path(&path, 1).exists());
    assert!(rotated_path(&path, 2).exists());
    assert!(!rotated_path(&path, 3).exists());
    assert!(fs::read_to_string(rotated_path(&path, 2)).unwrap().contains("run 1"));
}

#[test]
fn test_policy_selects_sink_kind() {
    let dir = tempfile::tempdir().unwrap();
    let policy = dir.path().join("govern.json");

    fs::write(
        &policy,
        json!({
            "languages": { "blocked": ["php"] },
            "audit": { "level": "basic", "output_file": "out/plain.jsonl" }
        })
        .to_string(),
    )
    .unwrap();
    let loaded = RuleStore::load(&policy).unwrap();
    let gov = Governance::from_policy(&loaded, None).quiet();
    assert!(gov.check_polyglot_block("php", "<?php ?>", "a.naab", 1).is_some());
    let log = EventLog::open(
        dir.path().join("out/plain.jsonl"),
        RotationPolicy::default(),
    )
    .unwrap();
    let records = log.read_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event, AuditEvent::CheckFailed);
    assert_eq!(records[0].metadata["rule"], "languages.blocked");

    let rules: RuleSet = serde_json::from_value(json!({ "audit": { "level": "none" } })).unwrap();
    assert!(open_audit_sink(&rules, dir.path(), None).unwrap().is_none());
}

#[test]
fn test_tamper_evident_sink_from_policy() {
    let dir = tempfile::tempdir().unwrap();
    let policy = dir.path().join("govern.json");
    fs::write(
        &policy,
        json!({
            "mode": "audit",
            "code_quality": { "no_secrets": true },
            "audit": {
                "level": "full",
                "output_file": "ledger.jsonl",
                "tamper_evidence": true
            }
        })
        .to_string(),
    )
    .unwrap();

    let loaded = RuleStore::load(&policy).unwrap();
    let gov = Governance::from_policy(&loaded, Some(b"k3y".as_slice())).quiet();
    gov.check_polyglot_block("python", "password = 'hunter2hunter2'", "a.naab", 1);

    let report = verify_ledger(&dir.path().join("ledger.jsonl"), Some(b"k3y".as_slice()));
    assert!(report.is_valid, "{}", report.report());
    // languages pass, secret failure
    assert_eq!(report.total_entries, 2);
}
