//! Ticket types: the unit of support work.

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A support request filed by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub status: TicketStatus,
    pub created_by: String,
    pub assignee: Option<String>,

    /// The most recent triage suggestion. Older ones stay in storage.
    pub agent_suggestion_id: Option<Uuid>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Ticket {
    /// Whether the ticket has outlived its SLA without being resolved or closed.
    pub fn is_overdue(&self, now: Timestamp, sla_hours: u32) -> bool {
        if matches!(self.status, TicketStatus::Resolved | TicketStatus::Closed) {
            return false;
        }
        let age_seconds = now.as_second() - self.created_at.as_second();
        age_seconds >= i64::from(sla_hours) * 3600
    }
}

/// What a ticket is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Billing,
    #[serde(alias = "technical")]
    Tech,
    Shipping,
    Account,
    Other,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Billing,
        Self::Tech,
        Self::Shipping,
        Self::Account,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::Tech => "tech",
            Self::Shipping => "shipping",
            Self::Account => "account",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "billing" => Ok(Self::Billing),
            "tech" | "technical" => Ok(Self::Tech),
            "shipping" => Ok(Self::Shipping),
            "account" => Ok(Self::Account),
            "other" => Ok(Self::Other),
            other => {
                let known: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                Err(format!(
                    "unknown category: {other} (expected one of: {})",
                    known.join(", ")
                ))
            }
        }
    }
}

/// Where a ticket stands in its lifecycle.
///
/// Triage moves `open` tickets to `resolved` or `waiting_human`.
/// Everything after that is driven by people; see [`TicketStatus::can_move_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    WaitingHuman,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::WaitingHuman => "waiting_human",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Whether a human action may move a ticket from `self` to `next`.
    pub fn can_move_to(self, next: Self) -> bool {
        use TicketStatus::{Closed, InProgress, Open, Resolved, WaitingHuman};

        matches!(
            (self, next),
            (Open | WaitingHuman | Resolved, InProgress)
                | (InProgress, Resolved | Closed)
                | (Resolved, Closed)
        )
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" | "in-progress" => Ok(Self::InProgress),
            "waiting_human" => Ok(Self::WaitingHuman),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown ticket status: {other}")),
        }
    }
}

/// An agent's reply on a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author: String,
    pub body: String,
    pub created_at: Timestamp,
}
