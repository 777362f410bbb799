//! In-memory [`AuditSink`]. Useful for embedding hosts that forward events
//! elsewhere, and for asserting on audit traffic in tests.

use std::sync::Mutex;

use super::{AuditError, AuditEvent, AuditMetadata, AuditResult, AuditSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub event: AuditEvent,
    pub details: String,
    pub metadata: AuditMetadata,
}

#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, event: AuditEvent) -> usize {
        self.events
            .lock()
            .map(|e| e.iter().filter(|r| r.event == event).count())
            .unwrap_or(0)
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(
        &self,
        event: AuditEvent,
        details: &str,
        metadata: &AuditMetadata,
    ) -> AuditResult<()> {
        let mut events = self.events.lock().map_err(|_| AuditError::Poisoned)?;
        events.push(RecordedEvent {
            event,
            details: details.to_string(),
            metadata: metadata.clone(),
        });
        Ok(())
    }
}
