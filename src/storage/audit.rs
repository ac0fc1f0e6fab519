//! Audit log storage: append and load audit entries.
//!
//! The store stamps `recorded_at` at write time, as integer microseconds.
//! Entries load in write order (`seq`).

use jiff::Timestamp;
use uuid::Uuid;

use crate::model::AuditEntry;

use super::{Result, Storage, StorageError, parse_enum, parse_uuid};

impl Storage {
    /// Appends one entry to a ticket's audit trail.
    ///
    /// The entry's own `recorded_at` is ignored: the write time is recorded.
    pub fn append_audit(&self, entry: &AuditEntry) -> Result<()> {
        let conn = self.open()?;
        super::ticket::ensure_ticket_exists(&conn, entry.ticket_id)?;
        conn.execute(
            "INSERT INTO audit_log (ticket_id, trace_id, actor, action, meta, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                entry.ticket_id.to_string(),
                entry.trace_id.to_string(),
                &entry.actor,
                entry.action.as_str(),
                serde_json::to_string(&entry.meta)?,
                Timestamp::now().as_microsecond(),
            ],
        )?;
        Ok(())
    }

    /// Loads a ticket's audit trail in order.
    pub fn load_audit(&self, ticket_id: Uuid) -> Result<Vec<AuditEntry>> {
        let conn = self.open()?;
        super::ticket::ensure_ticket_exists(&conn, ticket_id)?;
        let mut stmt = conn.prepare(
            "SELECT trace_id, actor, action, meta, recorded_at FROM audit_log
             WHERE ticket_id = ?1
             ORDER BY seq",
        )?;
        let rows = stmt
            .query_map([ticket_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(trace_id, actor, action, meta, recorded_at)| {
                Ok(AuditEntry {
                    ticket_id,
                    trace_id: parse_uuid(&trace_id, "trace id")?,
                    actor,
                    action: parse_enum(&action)?,
                    meta: serde_json::from_str(&meta)?,
                    recorded_at: Timestamp::from_microsecond(recorded_at).map_err(|e| {
                        StorageError::Corrupt(format!("invalid recorded_at: {e}"))
                    })?,
                })
            })
            .collect()
    }

    /// Loads only the entries written under one trace.
    pub fn load_trace(&self, ticket_id: Uuid, trace_id: Uuid) -> Result<Vec<AuditEntry>> {
        let mut entries = self.load_audit(ticket_id)?;
        entries.retain(|e| e.trace_id == trace_id);
        Ok(entries)
    }
}
