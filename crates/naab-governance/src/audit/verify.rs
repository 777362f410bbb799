//! Ledger verification.
//!
//! Verification never fails; every problem becomes part of the returned
//! [`VerificationReport`]. Once the chain breaks, every later entry is
//! reported as tampered because nothing after the break can be trusted.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ledger::{verify_signature, LedgerEntry, GENESIS_HASH};
use crate::obs;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub is_valid: bool,
    pub total_entries: usize,
    pub verified_entries: usize,
    pub tampered_sequences: Vec<u64>,
    pub missing_sequences: Vec<u64>,
    pub invalid_signatures: Vec<u64>,
    pub errors: Vec<String>,
}

impl VerificationReport {
    /// Human-readable summary.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let status = if self.is_valid { "VALID" } else { "INVALID" };
        let _ = writeln!(out, "Audit ledger verification: {status}");
        let _ = writeln!(
            out,
            "  Entries: {} total, {} verified",
            self.total_entries, self.verified_entries
        );
        if !self.tampered_sequences.is_empty() {
            let _ = writeln!(out, "  Tampered: {}", join(&self.tampered_sequences));
        }
        if !self.missing_sequences.is_empty() {
            let _ = writeln!(out, "  Missing: {}", join(&self.missing_sequences));
        }
        if !self.invalid_signatures.is_empty() {
            let _ = writeln!(out, "  Bad signatures: {}", join(&self.invalid_signatures));
        }
        for err in &self.errors {
            let _ = writeln!(out, "  - {err}");
        }
        out
    }
}

fn join(seqs: &[u64]) -> String {
    seqs.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Verify the ledger at `path`. When `key` is given, every entry must carry
/// a valid signature under it.
pub fn verify_ledger(path: &Path, key: Option<&[u8]>) -> VerificationReport {
    let report = match std::fs::read_to_string(path) {
        Ok(text) => verify_text(&text, key),
        Err(e) => VerificationReport {
            is_valid: false,
            errors: vec![format!("cannot read {}: {e}", path.display())],
            ..VerificationReport::default()
        },
    };
    obs::emit_ledger_verified(
        path,
        report.is_valid,
        report.total_entries,
        report.verified_entries,
    );
    report
}

/// Verify ledger content already in memory.
pub fn verify_text(text: &str, key: Option<&[u8]>) -> VerificationReport {
    let mut report = VerificationReport::default();
    let mut tampered = BTreeSet::new();
    let mut expected_seq: u64 = 0;
    let mut prev_hash = GENESIS_HASH.to_string();
    let mut broken = false;
    let gap_limit = text.lines().count() as u64 + 1;

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        report.total_entries += 1;

        let entry: LedgerEntry = match serde_json::from_str(line) {
            Ok(e) => e,
            Err(e) => {
                report
                    .errors
                    .push(format!("line {}: malformed entry: {e}", idx + 1));
                broken = true;
                continue;
            }
        };
        let seq = entry.sequence;
        let mut clean = !broken;

        if seq > expected_seq {
            // A gap wider than the file cannot come from deleted lines alone.
            if seq - expected_seq <= gap_limit {
                report.missing_sequences.extend(expected_seq..seq);
                report.errors.push(format!(
                    "sequence gap: expected {expected_seq}, found {seq}"
                ));
            } else {
                report.errors.push(format!(
                    "sequence jump to {seq} (expected {expected_seq})"
                ));
            }
            clean = false;
        } else if seq < expected_seq {
            report.errors.push(format!(
                "sequence {seq} out of order (expected {expected_seq})"
            ));
            clean = false;
        }
        expected_seq = expected_seq.max(seq.saturating_add(1));

        let computed = entry.compute_hash();
        if entry.hash != computed {
            report.errors.push(format!("sequence {seq}: hash mismatch"));
            clean = false;
        }
        if entry.prev_hash != prev_hash {
            report
                .errors
                .push(format!("sequence {seq}: chain link broken"));
            clean = false;
        }
        if let Some(key) = key {
            let signed = entry
                .signature
                .as_deref()
                .is_some_and(|sig| verify_signature(key, &entry.hash, sig));
            if !signed {
                report.invalid_signatures.push(seq);
                report
                    .errors
                    .push(format!("sequence {seq}: missing or invalid signature"));
                clean = false;
            }
        }

        if clean {
            report.verified_entries += 1;
        } else {
            broken = true;
            tampered.insert(seq);
        }
        prev_hash = computed;
    }

    report.tampered_sequences = tampered.into_iter().collect();
    report.is_valid = report.errors.is_empty();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditMetadata, TamperEvidentLedger};

    fn build(n: usize) -> (tempfile::TempDir, std::path::PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ledger.jsonl");
        let ledger = TamperEvidentLedger::open(&path).unwrap();
        for i in 0..n {
            ledger
                .append("CHECK_FAILED", &format!("event {i}"), AuditMetadata::new())
                .unwrap();
        }
        (tmp, path)
    }

    #[test]
    fn test_empty_ledger_is_valid() {
        let report = verify_text("", None);
        assert!(report.is_valid);
        assert_eq!(report.total_entries, 0);
    }

    #[test]
    fn test_intact_chain_verifies() {
        let (_tmp, path) = build(5);
        let report = verify_ledger(&path, None);
        assert!(report.is_valid, "{}", report.report());
        assert_eq!(report.verified_entries, 5);
    }

    #[test]
    fn test_malformed_line_taints_rest() {
        let (_tmp, path) = build(3);
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines: Vec<&str> = text.lines().collect();
        lines[1] = "{not json";
        let report = verify_text(&lines.join("\n"), None);
        assert!(!report.is_valid);
        assert_eq!(report.verified_entries, 1);
        assert_eq!(report.tampered_sequences, vec![2]);
    }

    fn with_sequence(line: &str, sequence: u64) -> String {
        let mut entry: LedgerEntry = serde_json::from_str(line).unwrap();
        entry.sequence = sequence;
        entry.hash = entry.compute_hash();
        serde_json::to_string(&entry).unwrap()
    }

    #[test]
    fn test_huge_sequence_jump_is_reported_not_listed() {
        let (_tmp, path) = build(1);
        let text = std::fs::read_to_string(&path).unwrap();
        let forged = with_sequence(text.lines().next().unwrap(), 4_000_000_000);

        let report = verify_text(&forged, None);
        assert!(!report.is_valid);
        assert!(report.missing_sequences.is_empty());
        assert!(report.errors[0].contains("sequence jump to 4000000000"));
        assert_eq!(report.tampered_sequences, vec![4_000_000_000]);
    }

    #[test]
    fn test_max_sequence_does_not_overflow() {
        let (_tmp, path) = build(2);
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        let forged = format!("{}\n{}", with_sequence(lines[0], u64::MAX), lines[1]);

        let report = verify_text(&forged, None);
        assert!(!report.is_valid);
        assert!(report.missing_sequences.is_empty());
        assert_eq!(report.total_entries, 2);
        assert_eq!(report.tampered_sequences, vec![1, u64::MAX]);
    }

    #[test]
    fn test_small_gap_lists_missing() {
        let (_tmp, path) = build(4);
        let text = std::fs::read_to_string(&path).unwrap();
        let kept: Vec<&str> = text
            .lines()
            .enumerate()
            .filter(|(i, _)| *i != 1 && *i != 2)
            .map(|(_, l)| l)
            .collect();
        let report = verify_text(&kept.join("\n"), None);
        assert_eq!(report.missing_sequences, vec![1, 2]);
    }

    #[test]
    fn test_missing_file_reported() {
        let report = verify_ledger(Path::new("/nonexistent/ledger.jsonl"), None);
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("cannot read"));
    }

    #[test]
    fn test_report_text() {
        let report = VerificationReport {
            is_valid: false,
            total_entries: 4,
            verified_entries: 2,
            tampered_sequences: vec![2, 3],
            missing_sequences: vec![],
            invalid_signatures: vec![],
            errors: vec!["sequence 2: hash mismatch".into()],
        };
        let text = report.report();
        assert!(text.contains("INVALID"));
        assert!(text.contains("Tampered: 2, 3"));
        assert!(text.contains("4 total, 2 verified"));
    }
}
