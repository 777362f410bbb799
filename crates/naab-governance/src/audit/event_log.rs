//! Append-only JSONL event log with size-based rotation.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{AuditError, AuditEvent, AuditMetadata, AuditResult, AuditSink};
use crate::rules::Retention;

/// One line of the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: String,
    pub event: AuditEvent,
    pub details: String,
    #[serde(default, skip_serializing_if = "AuditMetadata::is_empty")]
    pub metadata: AuditMetadata,
}

/// When to rotate and how many rotated files to keep (`file.1` newest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Zero disables rotation.
    pub max_bytes: u64,
    pub keep: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::from(&Retention::default())
    }
}

impl From<&Retention> for RotationPolicy {
    fn from(r: &Retention) -> Self {
        let mb = if r.rotate_at_mb > 0 {
            r.rotate_at_mb
        } else {
            r.max_file_size_mb
        };
        Self {
            max_bytes: mb.saturating_mul(1024 * 1024),
            keep: r.keep_rotated,
        }
    }
}

#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    rotation: RotationPolicy,
    write_lock: Mutex<()>,
}

impl EventLog {
    /// Open (or create) the log at `path`, creating parent directories.
    pub fn open(path: impl Into<PathBuf>, rotation: RotationPolicy) -> AuditResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AuditError::io(parent, e))?;
        }
        Ok(Self {
            path,
            rotation,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(
        &self,
        event: AuditEvent,
        details: &str,
        metadata: &AuditMetadata,
    ) -> AuditResult<()> {
        let record = EventRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event,
            details: details.to_string(),
            metadata: metadata.clone(),
        };
        let line = serde_json::to_string(&record)?;

        let _guard = self.write_lock.lock().map_err(|_| AuditError::Poisoned)?;
        self.rotate_if_needed()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AuditError::io(&self.path, e))?;
        writeln!(file, "{line}").map_err(|e| AuditError::io(&self.path, e))?;
        file.flush().map_err(|e| AuditError::io(&self.path, e))
    }

    pub fn log_security_violation(&self, details: &str) -> AuditResult<()> {
        self.log(AuditEvent::SecurityViolation, details, &AuditMetadata::new())
    }

    /// Records of the live file, oldest first. Rotated files are not read.
    pub fn read_all(&self) -> AuditResult<Vec<EventRecord>> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AuditError::io(&self.path, e)),
        };
        let mut records = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| AuditError::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| AuditError::Malformed {
                line: idx + 1,
                message: e.to_string(),
            })?;
            records.push(record);
        }
        Ok(records)
    }

    fn rotate_if_needed(&self) -> AuditResult<()> {
        if self.rotation.max_bytes == 0 {
            return Ok(());
        }
        let size = match fs::metadata(&self.path) {
            Ok(m) => m.len(),
            Err(_) => return Ok(()),
        };
        if size < self.rotation.max_bytes {
            return Ok(());
        }

        if self.rotation.keep == 0 {
            return fs::remove_file(&self.path).map_err(|e| AuditError::io(&self.path, e));
        }
        let oldest = rotated_path(&self.path, self.rotation.keep);
        if oldest.exists() {
            fs::remove_file(&oldest).map_err(|e| AuditError::io(&oldest, e))?;
        }
        for i in (1..self.rotation.keep).rev() {
            let from = rotated_path(&self.path, i);
            if from.exists() {
                let to = rotated_path(&self.path, i + 1);
                fs::rename(&from, &to).map_err(|e| AuditError::io(&from, e))?;
            }
        }
        let first = rotated_path(&self.path, 1);
        fs::rename(&self.path, &first).map_err(|e| AuditError::io(&self.path, e))
    }
}

impl AuditSink for EventLog {
    fn record(
        &self,
        event: AuditEvent,
        details: &str,
        metadata: &AuditMetadata,
    ) -> AuditResult<()> {
        self.log(event, details, metadata)
    }
}

/// `audit.jsonl` -> `audit.jsonl.3`
pub fn rotated_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_and_read_back() {
        let tmp = tempfile::tempdir().unwrap();
        let log = EventLog::open(tmp.path().join("nested/audit.jsonl"), RotationPolicy::default())
            .unwrap();

        let mut meta = AuditMetadata::new();
        meta.insert("rule".into(), "code_quality.no_secrets".into());
        log.log(AuditEvent::CheckFailed, "secret found", &meta).unwrap();
        log.log_security_violation("fs_write on /etc").unwrap();

        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event, AuditEvent::CheckFailed);
        assert_eq!(records[0].metadata["rule"], "code_quality.no_secrets");
        assert_eq!(records[1].event, AuditEvent::SecurityViolation);
        assert!(records[1].metadata.is_empty());
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let log = EventLog::open(tmp.path().join("none.jsonl"), RotationPolicy::default()).unwrap();
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_rotation_keeps_bounded_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("audit.jsonl");
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

        assert!(path.exists());
        assert!(rotated_path(&path, 1).exists());
        assert!(rotated_path(&path, 2).exists());
        assert!(!rotated_path(&path, 3).exists());

        let live = log.read_all().unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].details, "run 3");
    }

    #[test]
    fn test_rotated_path_naming() {
        assert_eq!(
            rotated_path(Path::new("/var/log/audit.jsonl"), 2),
            PathBuf::from("/var/log/audit.jsonl.2")
        );
    }
}
