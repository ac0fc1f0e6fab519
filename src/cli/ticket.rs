//! Ticket commands: new, list, show, audit, reply, assign, triage.

use std::collections::HashSet;

use clap::Subcommand;
use jiff::Timestamp;
use tracing::warn;
use uuid::Uuid;

use crate::desk::{self, NewTicket};
use crate::model::{Category, Ticket, TicketStatus, TriageConfig};
use crate::storage::Storage;

use super::format::{
    format_audit_entry, format_reply, format_suggestion, format_ticket, format_ticket_line,
};
use super::{resolve_prefix, short_id, triage_tickets};

#[derive(Debug, Subcommand)]
pub enum TicketCommand {
    /// Open a ticket and triage it. Prints the ticket ID and the outcome.
    New {
        /// Short summary.
        #[arg(long)]
        title: String,

        /// billing, tech, shipping, account, or other. Defaults to other.
        #[arg(long)]
        category: Option<Category>,

        /// Leave the ticket open instead of triaging it now.
        #[arg(long)]
        no_triage: bool,

        /// What the problem is.
        description: String,
    },

    /// List tickets, oldest first.
    List {
        /// Only tickets in this status.
        #[arg(long)]
        status: Option<TicketStatus>,

        /// Only tickets past the SLA that are not yet resolved or closed.
        #[arg(long)]
        overdue: bool,
    },

    /// Show a ticket with its latest suggestion and replies.
    Show {
        /// Ticket ID: full UUID or unambiguous prefix (e.g. `3f9`).
        ticket: String,
    },

    /// Show a ticket's audit trail, oldest first.
    Audit {
        /// Ticket ID: full UUID or unambiguous prefix.
        ticket: String,

        /// Only entries from this trace (full UUID or prefix).
        #[arg(long)]
        trace: Option<String>,
    },

    /// Reply to a ticket, change its status, or both.
    Reply {
        /// Ticket ID: full UUID or unambiguous prefix.
        ticket: String,

        /// New status: in-progress, resolved, or closed.
        #[arg(long)]
        status: Option<TicketStatus>,

        /// Reply text.
        body: Option<String>,
    },

    /// Assign a ticket.
    Assign {
        /// Ticket ID: full UUID or unambiguous prefix.
        ticket: String,

        /// Who takes the ticket.
        assignee: String,
    },

    /// Run triage again on tickets.
    Triage {
        /// Ticket IDs: full UUIDs or unambiguous prefixes.
        tickets: Vec<String>,

        /// Also triage every ticket still open.
        #[arg(long)]
        open: bool,
    },
}

pub(super) async fn run(
    command: TicketCommand,
    storage: &Storage,
    actor: impl Fn() -> Result<String, String>,
) -> Result<(), String> {
    match command {
        TicketCommand::New {
            title,
            category,
            no_triage,
            description,
        } => {
            let new = NewTicket {
                title,
                description,
                category,
            };
            cmd_new(storage, new, &actor()?, no_triage).await
        }
        TicketCommand::List { status, overdue } => cmd_list(storage, status, overdue),
        TicketCommand::Show { ticket } => cmd_show(storage, &resolve_ticket(storage, &ticket)?),
        TicketCommand::Audit { ticket, trace } => {
            cmd_audit(storage, &resolve_ticket(storage, &ticket)?, trace.as_deref())
        }
        TicketCommand::Reply {
            ticket,
            status,
            body,
        } => {
            let ticket = resolve_ticket(storage, &ticket)?;
            cmd_reply(storage, &ticket, &actor()?, body.as_deref(), status)
        }
        TicketCommand::Assign { ticket, assignee } => {
            let ticket = resolve_ticket(storage, &ticket)?;
            cmd_assign(storage, &ticket, &actor()?, &assignee)
        }
        TicketCommand::Triage { tickets, open } => cmd_triage(storage, &tickets, open).await,
    }
}

async fn cmd_new(
    storage: &Storage,
    new: NewTicket,
    creator: &str,
    no_triage: bool,
) -> Result<(), String> {
    let ticket =
        desk::open_ticket(storage, new, creator).map_err(|e| format!("failed to open ticket: {e}"))?;

    println!("{}", ticket.id);
    if no_triage {
        return Ok(());
    }
    triage_tickets(storage, &[ticket.id]).await
}

fn cmd_list(storage: &Storage, status: Option<TicketStatus>, overdue: bool) -> Result<(), String> {
    let tickets = storage
        .list_tickets()
        .map_err(|e| format!("failed to list tickets: {e}"))?;
    let sla_hours = sla_hours(storage);
    let now = Timestamp::now();

    let mut shown = 0;
    for ticket in &tickets {
        if status.is_some_and(|s| s != ticket.status) {
            continue;
        }
        let is_overdue = ticket.is_overdue(now, sla_hours);
        if overdue && !is_overdue {
            continue;
        }
        println!("{}", format_ticket_line(ticket, is_overdue));
        shown += 1;
    }

    if shown == 0 {
        println!("No tickets");
    }
    Ok(())
}

/// The SLA to measure against. Falls back to the default policy.
fn sla_hours(storage: &Storage) -> u32 {
    match storage.load_triage_config() {
        Ok(Some(config)) => config.sla_hours,
        Ok(None) => TriageConfig::default().sla_hours,
        Err(e) => {
            warn!(error = %e, "triage config unavailable, using default SLA");
            TriageConfig::default().sla_hours
        }
    }
}

fn cmd_show(storage: &Storage, ticket: &Ticket) -> Result<(), String> {
    print!("{}", format_ticket(ticket));

    if let Some(suggestion_id) = ticket.agent_suggestion_id {
        let suggestion = storage
            .load_suggestion(suggestion_id)
            .map_err(|e| format!("failed to load suggestion: {e}"))?;
        if let Some(suggestion) = suggestion {
            println!();
            print!("{}", format_suggestion(&suggestion));
        }

        let runs = storage
            .list_suggestions(ticket.id)
            .map_err(|e| format!("failed to load suggestions: {e}"))?
            .len();
        if runs > 1 {
            println!("  ({} earlier suggestion(s))", runs - 1);
        }
    }

    let replies = storage
        .load_replies(ticket.id)
        .map_err(|e| format!("failed to load replies: {e}"))?;
    if !replies.is_empty() {
        println!();
        for reply in &replies {
            println!("{}", format_reply(reply));
        }
    }

    Ok(())
}

fn cmd_audit(storage: &Storage, ticket: &Ticket, trace: Option<&str>) -> Result<(), String> {
    let entries = match trace {
        None => storage.load_audit(ticket.id),
        Some(reference) => {
            let trace_id = resolve_trace(storage, ticket, reference)?;
            storage.load_trace(ticket.id, trace_id)
        }
    }
    .map_err(|e| format!("failed to load audit trail: {e}"))?;

    if entries.is_empty() {
        println!("No audit entries");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_audit_entry(entry));
    }
    Ok(())
}

fn cmd_reply(
    storage: &Storage,
    ticket: &Ticket,
    actor: &str,
    body: Option<&str>,
    status: Option<TicketStatus>,
) -> Result<(), String> {
    let updated = desk::reply(storage, ticket.id, actor, body, status)
        .map_err(|e| format!("failed to reply: {e}"))?;

    let short = short_id(updated.id);
    if body.is_some() {
        eprintln!("Replied to {short}");
    }
    if status.is_some() {
        eprintln!("Ticket {short} is now {}", updated.status);
    }
    Ok(())
}

fn cmd_assign(
    storage: &Storage,
    ticket: &Ticket,
    actor: &str,
    assignee: &str,
) -> Result<(), String> {
    let updated = desk::assign(storage, ticket.id, actor, assignee)
        .map_err(|e| format!("failed to assign: {e}"))?;

    if let Some(assignee) = &updated.assignee {
        eprintln!("Ticket {} assigned to {assignee}", short_id(updated.id));
    }
    Ok(())
}

async fn cmd_triage(storage: &Storage, references: &[String], open: bool) -> Result<(), String> {
    let tickets = storage
        .list_tickets()
        .map_err(|e| format!("failed to list tickets: {e}"))?;

    let mut ids = Vec::new();
    for reference in references {
        ids.push(resolve_prefix(&tickets, |t| t.id, reference, "ticket")?.id);
    }
    if open {
        ids.extend(
            tickets
                .iter()
                .filter(|t| t.status == TicketStatus::Open)
                .map(|t| t.id),
        );
    }
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));

    if ids.is_empty() {
        return Err("nothing to triage: pass ticket IDs or --open".to_string());
    }
    triage_tickets(storage, &ids).await
}

/// Resolve a ticket reference (full UUID or unambiguous prefix).
fn resolve_ticket(storage: &Storage, reference: &str) -> Result<Ticket, String> {
    if let Ok(id) = reference.parse::<Uuid>() {
        return storage
            .load_ticket(id)
            .map_err(|e| format!("failed to load ticket: {e}"));
    }

    let tickets = storage
        .list_tickets()
        .map_err(|e| format!("failed to list tickets: {e}"))?;
    resolve_prefix(&tickets, |t| t.id, reference, "ticket").cloned()
}

/// Resolve a trace reference against the traces recorded for a ticket.
fn resolve_trace(storage: &Storage, ticket: &Ticket, reference: &str) -> Result<Uuid, String> {
    if let Ok(id) = reference.parse::<Uuid>() {
        return Ok(id);
    }

    let mut traces: Vec<Uuid> = storage
        .load_audit(ticket.id)
        .map_err(|e| format!("failed to load audit trail: {e}"))?
        .into_iter()
        .map(|entry| entry.trace_id)
        .collect();
    traces.sort_unstable();
    traces.dedup();

    resolve_prefix(&traces, |id| *id, reference, "trace").copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::tests::{sample_ticket, test_storage};

    #[test]
    fn resolves_ticket_by_prefix_and_full_id() {
        let (_dir, storage) = test_storage();
        let ticket = sample_ticket("Shipment delayed 5 days");
        storage.create_ticket(&ticket).unwrap();

        let full = ticket.id.to_string();
        assert_eq!(resolve_ticket(&storage, &full).unwrap().id, ticket.id);
        assert_eq!(resolve_ticket(&storage, &full[..6]).unwrap().id, ticket.id);
    }

    #[test]
    fn unknown_ticket_reference_is_an_error() {
        let (_dir, storage) = test_storage();
        assert!(resolve_ticket(&storage, "zzz").is_err());
        assert!(resolve_ticket(&storage, &Uuid::new_v4().to_string()).is_err());
    }

    #[test]
    fn sla_falls_back_to_default() {
        let (_dir, storage) = test_storage();
        assert_eq!(sla_hours(&storage), 24);

        let config = TriageConfig {
            sla_hours: 4,
            ..TriageConfig::default()
        };
        storage.save_triage_config(&config).unwrap();
        assert_eq!(sla_hours(&storage), 4);
    }

    #[test]
    fn resolves_trace_by_prefix() {
        let (_dir, storage) = test_storage();
        let ticket = desk::open_ticket(
            &storage,
            NewTicket {
                title: "Where is my parcel?".into(),
                description: "It never arrived".into(),
                category: None,
            },
            "user@example.com",
        )
        .unwrap();
        let trace_id = storage.load_audit(ticket.id).unwrap()[0].trace_id;

        let prefix = &trace_id.to_string()[..8];
        assert_eq!(resolve_trace(&storage, &ticket, prefix).unwrap(), trace_id);
    }
}
