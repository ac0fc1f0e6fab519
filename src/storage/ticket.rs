//! Ticket storage: create, load, update, and list tickets; append replies.

use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::model::{Reply, Ticket};

use super::{Result, Storage, StorageError, parse_enum, parse_timestamp, parse_uuid};

const TICKET_COLUMNS: &str = "id, title, description, category, status, created_by, assignee,
     agent_suggestion_id, created_at, updated_at";

impl Storage {
    /// Inserts a new ticket.
    pub fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO ticket (id, title, description, category, status, created_by, assignee,
                                 agent_suggestion_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                ticket.id.to_string(),
                &ticket.title,
                &ticket.description,
                ticket.category.as_str(),
                ticket.status.as_str(),
                &ticket.created_by,
                &ticket.assignee,
                ticket.agent_suggestion_id.map(|id| id.to_string()),
                ticket.created_at.to_string(),
                ticket.updated_at.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Writes every mutable field of a ticket back.
    pub fn update_ticket(&self, ticket: &Ticket) -> Result<()> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE ticket
             SET title = ?1, description = ?2, category = ?3, status = ?4, assignee = ?5,
                 agent_suggestion_id = ?6, updated_at = ?7
             WHERE id = ?8",
            rusqlite::params![
                &ticket.title,
                &ticket.description,
                ticket.category.as_str(),
                ticket.status.as_str(),
                &ticket.assignee,
                ticket.agent_suggestion_id.map(|id| id.to_string()),
                ticket.updated_at.to_string(),
                ticket.id.to_string(),
            ],
        )?;
        if rows == 0 {
            return Err(StorageError::TicketNotFound(ticket.id));
        }
        Ok(())
    }

    /// Loads a single ticket.
    pub fn load_ticket(&self, id: Uuid) -> Result<Ticket> {
        let conn = self.open()?;
        let raw = conn
            .query_row(
                &format!("SELECT {TICKET_COLUMNS} FROM ticket WHERE id = ?1"),
                [id.to_string()],
                RawTicket::from_row,
            )
            .optional()?
            .ok_or(StorageError::TicketNotFound(id))?;
        raw.into_ticket()
    }

    /// Lists all tickets, oldest first.
    pub fn list_tickets(&self) -> Result<Vec<Ticket>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!("SELECT {TICKET_COLUMNS} FROM ticket"))?;
        let raws = stmt
            .query_map([], RawTicket::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut tickets = raws
            .into_iter()
            .map(RawTicket::into_ticket)
            .collect::<Result<Vec<_>>>()?;
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tickets)
    }

    /// Appends a reply to a ticket.
    pub fn add_reply(&self, reply: &Reply) -> Result<()> {
        let conn = self.open()?;
        ensure_ticket_exists(&conn, reply.ticket_id)?;
        conn.execute(
            "INSERT INTO reply (id, ticket_id, author, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                reply.id.to_string(),
                reply.ticket_id.to_string(),
                &reply.author,
                &reply.body,
                reply.created_at.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Loads a ticket's replies in the order they were written.
    pub fn load_replies(&self, ticket_id: Uuid) -> Result<Vec<Reply>> {
        let conn = self.open()?;
        ensure_ticket_exists(&conn, ticket_id)?;
        let mut stmt = conn.prepare(
            "SELECT id, author, body, created_at FROM reply WHERE ticket_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([ticket_id.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, author, body, created_at)| {
                Ok(Reply {
                    id: parse_uuid(&id, "reply id")?,
                    ticket_id,
                    author,
                    body,
                    created_at: parse_timestamp(&created_at, "reply created_at")?,
                })
            })
            .collect()
    }
}

pub(super) fn ensure_ticket_exists(conn: &Connection, id: Uuid) -> Result<()> {
    let found = conn
        .query_row("SELECT 1 FROM ticket WHERE id = ?1", [id.to_string()], |_| {
            Ok(())
        })
        .optional()?;
    found.ok_or(StorageError::TicketNotFound(id))
}

/// A ticket row as stored, before parsing.
struct RawTicket {
    id: String,
    title: String,
    description: String,
    category: String,
    status: String,
    created_by: String,
    assignee: Option<String>,
    agent_suggestion_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawTicket {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            status: row.get(4)?,
            created_by: row.get(5)?,
            assignee: row.get(6)?,
            agent_suggestion_id: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_ticket(self) -> Result<Ticket> {
        let agent_suggestion_id = self
            .agent_suggestion_id
            .as_deref()
            .map(|s| parse_uuid(s, "agent_suggestion_id"))
            .transpose()?;

        Ok(Ticket {
            id: parse_uuid(&self.id, "ticket id")?,
            title: self.title,
            description: self.description,
            category: parse_enum(&self.category)?,
            status: parse_enum(&self.status)?,
            created_by: self.created_by,
            assignee: self.assignee,
            agent_suggestion_id,
            created_at: parse_timestamp(&self.created_at, "created_at")?,
            updated_at: parse_timestamp(&self.updated_at, "updated_at")?,
        })
    }
}
