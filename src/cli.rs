//! CLI interface for the helpdesk.
//!
//! Each subcommand is non-interactive: arguments in, plain text out.
//! Diagnostics and logs go to stderr, results to stdout.
//!
//! Commands split into groups:
//!
//! - `helpdesk ticket ...`: open, list, show, reply, assign, and triage tickets.
//! - `helpdesk kb ...`: write and search knowledge base articles.
//! - `helpdesk config ...`: view or change the triage policy.
//! - `helpdesk seed`: load sample data.
//!
//! Ticket and article ids take a full UUID or an unambiguous prefix.

mod format;
mod kb;
mod policy;
mod seed;
mod ticket;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::config::Config;
use crate::identity;
use crate::storage::Storage;
use crate::triage::Orchestrator;
use crate::triage::queue::TriageQueue;

use format::format_report;
use kb::KbCommand;
use policy::ConfigCommand;
use ticket::TicketCommand;

/// Helpdesk: file, triage, and answer support tickets.
#[derive(Debug, Parser)]
#[command(name = "helpdesk", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Who is acting (e.g. `agent@example.com`).
    /// Falls back to `HELPDESK_ACTOR`, then `actor` in the config file.
    #[arg(long = "as", global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: a ticket from open to closed
  1. helpdesk seed
  2. helpdesk --as user@example.com ticket new --title "Where is my parcel?" "It never arrived"
     → prints the ticket ID and the triage outcome (e.g. 3f9c0a1e escalated)
  3. helpdesk ticket show 3f9
  4. helpdesk --as agent@example.com ticket reply 3f9 --status in-progress "Checking with the courier"
  5. helpdesk --as agent@example.com ticket reply 3f9 --status resolved "Delivered today"
  6. helpdesk ticket audit 3f9

Policy:
  helpdesk config set --threshold 0.85 --sla-hours 8"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Work with tickets.
    Ticket {
        #[command(subcommand)]
        command: TicketCommand,
    },

    /// Work with the knowledge base.
    Kb {
        #[command(subcommand)]
        command: KbCommand,
    },

    /// View or change the triage policy.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Load the sample articles and tickets, triaging each ticket.
    Seed,
}

/// Run a parsed command, returning an error message on failure.
pub async fn run(cli: Cli, config: &Config, storage: &Storage) -> Result<(), String> {
    let actor = || identity::resolve_actor(cli.actor.as_deref(), config);

    match cli.command {
        Command::Ticket { command } => ticket::run(command, storage, actor).await,
        Command::Kb { command } => kb::run(command, storage),
        Command::Config { command } => policy::run(command, storage),
        Command::Seed => seed::run(storage).await,
    }
}

/// Triage tickets through the background queue and wait for all of them.
///
/// Prints one line per completed run. Every failure is printed to stderr and
/// the command fails if any run did.
async fn triage_tickets(storage: &Storage, ticket_ids: &[Uuid]) -> Result<(), String> {
    let orchestrator = Arc::new(Orchestrator::new(storage.clone()));
    let (queue, mut failures) = TriageQueue::spawn(orchestrator);

    for &id in ticket_ids {
        queue
            .submit(id)
            .map_err(|e| format!("failed to queue {id}: {e}"))?;
    }

    for report in queue.drain().await {
        println!("{}", format_report(&report));
    }

    let mut failed = 0;
    while let Ok(failure) = failures.try_recv() {
        failed += 1;
        eprintln!(
            "Triage failed for {}: {}",
            short_id(failure.ticket_id),
            failure.cause
        );
    }

    match failed {
        0 => Ok(()),
        n => Err(format!("{n} triage run(s) failed")),
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Resolve a reference (full UUID or unambiguous prefix) against a list.
///
/// Case-insensitive. An empty reference matches nothing.
fn resolve_prefix<'a, T>(
    items: &'a [T],
    id_of: impl Fn(&T) -> Uuid,
    reference: &str,
    noun: &str,
) -> Result<&'a T, String> {
    let prefix = reference.trim().to_ascii_lowercase();
    if prefix.is_empty() {
        return Err(format!("{noun} ID is required"));
    }

    let matches: Vec<&T> = items
        .iter()
        .filter(|item| id_of(item).to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(format!("no {noun} matching '{reference}'")),
        [only] => Ok(only),
        many => {
            let ids: Vec<String> = many.iter().map(|item| short_id(id_of(item))).collect();
            Err(format!(
                "'{reference}' is ambiguous: matches {} {noun}s: {}",
                many.len(),
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ticket_new() {
        let cli = Cli::try_parse_from([
            "helpdesk",
            "--as",
            "user@example.com",
            "ticket",
            "new",
            "--title",
            "Refund",
            "--category",
            "billing",
            "Charged twice",
        ])
        .unwrap();

        assert_eq!(cli.actor.as_deref(), Some("user@example.com"));
        assert!(matches!(
            cli.command,
            Command::Ticket {
                command: TicketCommand::New { .. }
            }
        ));
    }

    #[test]
    fn actor_flag_is_global() {
        let cli = Cli::try_parse_from([
            "helpdesk",
            "ticket",
            "reply",
            "3f9",
            "--as",
            "agent@example.com",
            "--status",
            "in-progress",
        ])
        .unwrap();

        assert_eq!(cli.actor.as_deref(), Some("agent@example.com"));
    }

    #[test]
    fn prefix_resolution() {
        let ids = [
            "aaaa0000-0000-4000-8000-000000000000".parse::<Uuid>().unwrap(),
            "aaab0000-0000-4000-8000-000000000000".parse::<Uuid>().unwrap(),
            "bbbb0000-0000-4000-8000-000000000000".parse::<Uuid>().unwrap(),
        ];

        assert_eq!(*resolve_prefix(&ids, |id| *id, "b", "ticket").unwrap(), ids[2]);
        assert_eq!(*resolve_prefix(&ids, |id| *id, "aaab", "ticket").unwrap(), ids[1]);

        let ambiguous = resolve_prefix(&ids, |id| *id, "aaa", "ticket").unwrap_err();
        assert!(ambiguous.contains("ambiguous"));
        assert!(ambiguous.contains("aaaa0000"));

        let missing = resolve_prefix(&ids, |id| *id, "c", "ticket").unwrap_err();
        assert_eq!(missing, "no ticket matching 'c'");
    }

    #[test]
    fn prefix_resolution_ignores_case() {
        let ids = [
            "3f9c0000-0000-4000-8000-000000000000".parse::<Uuid>().unwrap(),
            "bbbb0000-0000-4000-8000-000000000000".parse::<Uuid>().unwrap(),
        ];

        assert_eq!(*resolve_prefix(&ids, |id| *id, "3F9", "ticket").unwrap(), ids[0]);
        assert_eq!(*resolve_prefix(&ids, |id| *id, "BbB", "ticket").unwrap(), ids[1]);
    }

    #[test]
    fn empty_reference_matches_nothing() {
        let ids = ["3f9c0000-0000-4000-8000-000000000000".parse::<Uuid>().unwrap()];

        assert_eq!(
            resolve_prefix(&ids, |id| *id, "", "ticket").unwrap_err(),
            "ticket ID is required"
        );
        assert!(resolve_prefix(&ids, |id| *id, "  ", "ticket").is_err());
    }
}
