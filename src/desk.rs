//! Human-side ticket operations: opening, replying, changing status, assigning.
//!
//! Input is validated here, before anything reaches triage. Each call is one
//! human action and writes its audit entries under its own trace.

use jiff::Timestamp;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::audit::AuditTrail;
use crate::model::{AuditAction, Category, Reply, Ticket, TicketStatus};
use crate::storage::{Storage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("ticket not found: {0}")]
    NotFound(Uuid),

    #[error("cannot move ticket from {from} to {to}")]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
    },

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for DeskError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::TicketNotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

/// What a user submits to open a ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
}

impl NewTicket {
    fn validate(&self) -> Result<(), DeskError> {
        if self.title.trim().is_empty() {
            return Err(DeskError::Validation("title is required".into()));
        }
        if self.description.trim().is_empty() {
            return Err(DeskError::Validation("description is required".into()));
        }
        Ok(())
    }
}

/// Persists a new open ticket. Triage is the caller's next step.
pub fn open_ticket(storage: &Storage, new: NewTicket, creator: &str) -> Result<Ticket, DeskError> {
    new.validate()?;

    let now = Timestamp::now();
    let ticket = Ticket {
        id: Uuid::new_v4(),
        title: new.title.trim().to_string(),
        description: new.description.trim().to_string(),
        category: new.category.unwrap_or(Category::Other),
        status: TicketStatus::Open,
        created_by: creator.to_string(),
        assignee: None,
        agent_suggestion_id: None,
        created_at: now,
        updated_at: now,
    };
    storage.create_ticket(&ticket)?;

    AuditTrail::start(storage, ticket.id, creator).record(
        AuditAction::TicketCreated,
        json!({ "title": ticket.title, "category": ticket.category }),
    )?;

    info!(ticket = %ticket.id, creator, "ticket opened");
    Ok(ticket)
}

/// Replies to a ticket, changes its status, or both.
///
/// Status changes must follow [`TicketStatus::can_move_to`].
pub fn reply(
    storage: &Storage,
    ticket_id: Uuid,
    actor: &str,
    body: Option<&str>,
    status: Option<TicketStatus>,
) -> Result<Ticket, DeskError> {
    let body = body.map(str::trim).filter(|b| !b.is_empty());
    if body.is_none() && status.is_none() {
        return Err(DeskError::Validation(
            "a reply needs a body, a status, or both".into(),
        ));
    }

    let mut ticket = storage.load_ticket(ticket_id)?;
    if let Some(next) = status
        && !ticket.status.can_move_to(next)
    {
        return Err(DeskError::InvalidTransition {
            from: ticket.status,
            to: next,
        });
    }

    let trail = AuditTrail::start(storage, ticket.id, actor);

    if let Some(body) = body {
        let reply = Reply {
            id: Uuid::new_v4(),
            ticket_id: ticket.id,
            author: actor.to_string(),
            body: body.to_string(),
            created_at: Timestamp::now(),
        };
        storage.add_reply(&reply)?;
        trail.record(AuditAction::Replied, json!({ "replyId": reply.id }))?;
    }

    if let Some(next) = status {
        let from = ticket.status;
        ticket.status = next;
        ticket.updated_at = Timestamp::now();
        storage.update_ticket(&ticket)?;
        trail.record(
            AuditAction::StatusChanged,
            json!({ "from": from, "to": next }),
        )?;
        info!(ticket = %ticket.id, %from, to = %next, actor, "ticket status changed");
    }

    Ok(ticket)
}

/// Assigns a ticket to someone.
pub fn assign(
    storage: &Storage,
    ticket_id: Uuid,
    actor: &str,
    assignee: &str,
) -> Result<Ticket, DeskError> {
    let assignee = assignee.trim();
    if assignee.is_empty() {
        return Err(DeskError::Validation("assignee is required".into()));
    }

    let mut ticket = storage.load_ticket(ticket_id)?;
    let previous = ticket.assignee.replace(assignee.to_string());
    ticket.updated_at = Timestamp::now();
    storage.update_ticket(&ticket)?;

    AuditTrail::start(storage, ticket.id, actor).record(
        AuditAction::Assigned,
        json!({ "from": previous, "to": assignee }),
    )?;

    Ok(ticket)
}
