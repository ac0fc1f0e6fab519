//! Audit trail writing.
//!
//! Every triage run and every human action gets a fresh trace id. All entries
//! written through one [`AuditTrail`] share it, so a single run can be
//! reconstructed from the log alone.

use jiff::Timestamp;
use tracing::debug;
use uuid::Uuid;

use crate::model::{AuditAction, AuditEntry};
use crate::storage::{self, Storage};

/// Somewhere audit entries can be appended.
pub trait AuditSink {
    /// Persists one entry. Must fail loudly: callers stop on error.
    fn append_audit(&self, entry: &AuditEntry) -> storage::Result<()>;
}

impl AuditSink for Storage {
    fn append_audit(&self, entry: &AuditEntry) -> storage::Result<()> {
        Storage::append_audit(self, entry)
    }
}

/// Appends one entry stamped with the current time.
pub fn record<S: AuditSink + ?Sized>(
    sink: &S,
    ticket_id: Uuid,
    trace_id: Uuid,
    actor: &str,
    action: AuditAction,
    meta: serde_json::Value,
) -> storage::Result<()> {
    let entry = AuditEntry {
        ticket_id,
        trace_id,
        actor: actor.to_string(),
        action,
        meta,
        recorded_at: Timestamp::now(),
    };
    sink.append_audit(&entry)?;
    debug!(ticket = %ticket_id, trace = %trace_id, %action, "audit entry recorded");
    Ok(())
}

/// One trace's worth of audit writes for a single ticket and actor.
pub struct AuditTrail<'a, S: ?Sized> {
    sink: &'a S,
    ticket_id: Uuid,
    trace_id: Uuid,
    actor: String,
}

impl<'a, S: AuditSink + ?Sized> AuditTrail<'a, S> {
    /// Starts a new trace with a freshly generated id.
    pub fn start(sink: &'a S, ticket_id: Uuid, actor: impl Into<String>) -> Self {
        Self {
            sink,
            ticket_id,
            trace_id: Uuid::new_v4(),
            actor: actor.into(),
        }
    }

    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    pub fn record(&self, action: AuditAction, meta: serde_json::Value) -> storage::Result<()> {
        record(
            self.sink,
            self.ticket_id,
            self.trace_id,
            &self.actor,
            action,
            meta,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;

    use serde_json::json;

    use crate::storage::StorageError;

    /// Collects entries in memory; rejects everything once `fail` is set.
    #[derive(Default)]
    struct MemorySink {
        entries: RefCell<Vec<AuditEntry>>,
        fail: bool,
    }

    impl AuditSink for MemorySink {
        fn append_audit(&self, entry: &AuditEntry) -> storage::Result<()> {
            if self.fail {
                return Err(StorageError::Corrupt("disk full".into()));
            }
            self.entries.borrow_mut().push(entry.clone());
            Ok(())
        }
    }

    #[test]
    fn trail_stamps_every_entry_with_one_trace() {
        let sink = MemorySink::default();
        let ticket_id = Uuid::new_v4();
        let trail = AuditTrail::start(&sink, ticket_id, "agent@example.com");

        trail.record(AuditAction::Replied, json!({ "replyId": "r1" })).unwrap();
        trail
            .record(AuditAction::StatusChanged, json!({ "from": "open", "to": "in_progress" }))
            .unwrap();

        let entries = sink.entries.borrow();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.trace_id == trail.trace_id()));
        assert!(entries.iter().all(|e| e.ticket_id == ticket_id));
        assert!(entries.iter().all(|e| e.actor == "agent@example.com"));
    }

    #[test]
    fn separate_trails_get_separate_traces() {
        let sink = MemorySink::default();
        let ticket_id = Uuid::new_v4();

        let first = AuditTrail::start(&sink, ticket_id, "system");
        let second = AuditTrail::start(&sink, ticket_id, "system");

        assert_ne!(first.trace_id(), second.trace_id());
    }

    #[test]
    fn rejected_write_is_reported() {
        let sink = MemorySink {
            fail: true,
            ..MemorySink::default()
        };
        let trail = AuditTrail::start(&sink, Uuid::new_v4(), "system");

        let err = trail
            .record(AuditAction::TicketTriagedStarted, json!({}))
            .unwrap_err();

        assert!(matches!(err, StorageError::Corrupt(_)));
        assert!(sink.entries.borrow().is_empty());
    }
}
