//! Audit entries: the append-only record of what happened to a ticket.

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Actor name used for every entry written by triage.
pub const SYSTEM_ACTOR: &str = "system";

/// A single audit record.
///
/// Entries sharing a `trace_id` were written by the same triage run or the
/// same human action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub ticket_id: Uuid,
    pub trace_id: Uuid,
    pub actor: String,
    pub action: AuditAction,
    pub meta: serde_json::Value,

    /// Set by the store when the entry is written.
    pub recorded_at: Timestamp,
}

/// The fixed vocabulary of audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    // Triage.
    TicketTriagedStarted,
    AgentClassified,
    KbRetrieved,
    DraftGenerated,
    AutoClosed,
    AssignedToHuman,
    TicketTriagedCompleted,

    // Human actions.
    TicketCreated,
    Replied,
    StatusChanged,
    Assigned,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TicketTriagedStarted => "TICKET_TRIAGED_STARTED",
            Self::AgentClassified => "AGENT_CLASSIFIED",
            Self::KbRetrieved => "KB_RETRIEVED",
            Self::DraftGenerated => "DRAFT_GENERATED",
            Self::AutoClosed => "AUTO_CLOSED",
            Self::AssignedToHuman => "ASSIGNED_TO_HUMAN",
            Self::TicketTriagedCompleted => "TICKET_TRIAGED_COMPLETED",
            Self::TicketCreated => "TICKET_CREATED",
            Self::Replied => "REPLIED",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::Assigned => "ASSIGNED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s {
            "TICKET_TRIAGED_STARTED" => Self::TicketTriagedStarted,
            "AGENT_CLASSIFIED" => Self::AgentClassified,
            "KB_RETRIEVED" => Self::KbRetrieved,
            "DRAFT_GENERATED" => Self::DraftGenerated,
            "AUTO_CLOSED" => Self::AutoClosed,
            "ASSIGNED_TO_HUMAN" => Self::AssignedToHuman,
            "TICKET_TRIAGED_COMPLETED" => Self::TicketTriagedCompleted,
            "TICKET_CREATED" => Self::TicketCreated,
            "REPLIED" => Self::Replied,
            "STATUS_CHANGED" => Self::StatusChanged,
            "ASSIGNED" => Self::Assigned,
            other => return Err(format!("unknown audit action: {other}")),
        };
        Ok(action)
    }
}
