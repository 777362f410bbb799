//! Tamper-evident audit ledger.
//!
//! Each JSONL line is a [`LedgerEntry`] whose hash covers the previous
//! entry's hash, so editing, reordering or removing a line breaks the chain
//! from that point on. Entries may additionally carry an HMAC-SHA256
//! signature over the hash, keyed by a secret the writer holds.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::verify::{verify_ledger, VerificationReport};
use super::{AuditError, AuditEvent, AuditMetadata, AuditResult, AuditSink};
use crate::obs;

/// `prev_hash` of the first entry.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Prefix identifying the signature scheme.
pub const SIGNATURE_PREFIX: &str = "hmac-sha256:";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub sequence: u64,
    pub timestamp: String,
    pub prev_hash: String,
    pub event: String,
    pub details: String,
    #[serde(default, skip_serializing_if = "AuditMetadata::is_empty")]
    pub metadata: AuditMetadata,
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl LedgerEntry {
    /// The exact byte string that is hashed:
    /// `seq|timestamp|prev_hash|event|details[|metadata:k=v;k=v]`.
    pub fn canonical_string(&self) -> String {
        let mut s = format!(
            "{}|{}|{}|{}|{}",
            self.sequence, self.timestamp, self.prev_hash, self.event, self.details
        );
        if !self.metadata.is_empty() {
            s.push_str("|metadata:");
            for (k, v) in &self.metadata {
                s.push_str(k);
                s.push('=');
                s.push_str(v);
                s.push(';');
            }
        }
        s
    }

    pub fn compute_hash(&self) -> String {
        hex::encode(Sha256::digest(self.canonical_string().as_bytes()))
    }
}

/// Sign `hash` with `key`.
pub fn sign_hash(key: &[u8], hash: &str) -> AuditResult<String> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| AuditError::InvalidKey)?;
    mac.update(hash.as_bytes());
    Ok(format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Constant-time check of a `hmac-sha256:<hex>` signature.
pub fn verify_signature(key: &[u8], hash: &str, signature: &str) -> bool {
    let Some(hex_sig) = signature.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(hash.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[derive(Debug)]
struct ChainState {
    next_sequence: u64,
    last_hash: String,
    file: File,
}

/// Appends hash-chained entries. Appends serialize on an internal lock, so
/// one ledger may be shared across threads.
#[derive(Debug)]
pub struct TamperEvidentLedger {
    path: PathBuf,
    state: Mutex<ChainState>,
    hmac_key: Option<Vec<u8>>,
}

impl TamperEvidentLedger {
    /// Open `path`, resuming the chain from its last entry if it exists.
    pub fn open(path: impl Into<PathBuf>) -> AuditResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AuditError::io(parent, e))?;
        }

        let (next_sequence, last_hash) = match last_entry(&path)? {
            Some(entry) => (entry.sequence + 1, entry.hash),
            None => (0, GENESIS_HASH.to_string()),
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AuditError::io(&path, e))?;

        Ok(Self {
            path,
            state: Mutex::new(ChainState {
                next_sequence,
                last_hash,
                file,
            }),
            hmac_key: None,
        })
    }

    /// Sign every subsequent entry with `key`.
    pub fn with_hmac_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.hmac_key = Some(key.into());
        self
    }

    pub fn disable_hmac(&mut self) {
        self.hmac_key = None;
    }

    pub fn is_signing(&self) -> bool {
        self.hmac_key.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn next_sequence(&self) -> u64 {
        self.state.lock().map(|s| s.next_sequence).unwrap_or(0)
    }

    pub fn last_hash(&self) -> String {
        self.state
            .lock()
            .map(|s| s.last_hash.clone())
            .unwrap_or_default()
    }

    /// Append one entry. Sequence assignment, hashing and the durable write
    /// happen under one lock.
    pub fn append(
        &self,
        event: &str,
        details: &str,
        metadata: AuditMetadata,
    ) -> AuditResult<LedgerEntry> {
        let mut state = self.state.lock().map_err(|_| AuditError::Poisoned)?;

        let mut entry = LedgerEntry {
            sequence: state.next_sequence,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            prev_hash: state.last_hash.clone(),
            event: event.to_string(),
            details: details.to_string(),
            metadata,
            hash: String::new(),
            signature: None,
        };
        entry.hash = entry.compute_hash();
        if let Some(key) = &self.hmac_key {
            entry.signature = Some(sign_hash(key, &entry.hash)?);
        }

        let line = serde_json::to_string(&entry)?;
        writeln!(state.file, "{line}").map_err(|e| AuditError::io(&self.path, e))?;
        state.file.flush().map_err(|e| AuditError::io(&self.path, e))?;

        state.next_sequence += 1;
        state.last_hash = entry.hash.clone();
        obs::emit_ledger_appended(entry.sequence, &entry.event);
        Ok(entry)
    }

    pub fn entries(&self) -> AuditResult<Vec<LedgerEntry>> {
        read_entries(&self.path)
    }

    /// Verify the whole file, checking signatures when `key` is given.
    pub fn verify(&self, key: Option<&[u8]>) -> VerificationReport {
        verify_ledger(&self.path, key)
    }
}

impl AuditSink for TamperEvidentLedger {
    fn record(
        &self,
        event: AuditEvent,
        details: &str,
        metadata: &AuditMetadata,
    ) -> AuditResult<()> {
        self.append(event.as_str(), details, metadata.clone()).map(|_| ())
    }
}

/// Parse every non-empty line of a ledger file.
pub fn read_entries(path: &Path) -> AuditResult<Vec<LedgerEntry>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AuditError::io(path, e)),
    };
    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| AuditError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line).map_err(|e| AuditError::Malformed {
            line: idx + 1,
            message: e.to_string(),
        })?);
    }
    Ok(entries)
}

fn last_entry(path: &Path) -> AuditResult<Option<LedgerEntry>> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AuditError::io(path, e)),
    };
    let Some((idx, line)) = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .last()
    else {
        return Ok(None);
    };
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| AuditError::Malformed {
            line: idx + 1,
            message: e.to_string(),
        })
}
