//! Ticket triage: classify, retrieve, draft, decide.
//!
//! The [`Orchestrator`] runs the steps for one ticket in strict sequence and
//! writes one audit entry per step under a single trace id. It fails fast:
//! the first failed write ends the run, leaving the ticket as it was and the
//! audit trail showing how far the run got. Retrying means running again,
//! which starts a new trace and writes a new suggestion.

pub mod classify;
pub mod decide;
pub mod draft;
pub mod queue;
pub mod retrieve;

use std::fmt;
use std::time::Instant;

use jiff::Timestamp;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::{AuditSink, AuditTrail};
use crate::model::{
    AgentSuggestion, AuditAction, Category, ModelInfo, SYSTEM_ACTOR, Ticket, TicketStatus,
    TriageConfig,
};
use crate::storage::{self, Storage, StorageError};

use classify::{Classification, classify};
use decide::decide;
use draft::{Draft, draft};
use retrieve::{ArticleSource, retrieve};

pub const PROVIDER: &str = "stub";
pub const MODEL: &str = "deterministic";
pub const PROMPT_VERSION: &str = "1.0";

/// Everything triage reads and writes.
pub trait TriageStore: AuditSink + ArticleSource {
    fn load_ticket(&self, id: Uuid) -> storage::Result<Ticket>;
    fn save_ticket(&self, ticket: &Ticket) -> storage::Result<()>;
    fn create_suggestion(&self, suggestion: &AgentSuggestion) -> storage::Result<()>;
    fn mark_suggestion_auto_closed(&self, id: Uuid, auto_closed: bool) -> storage::Result<()>;
    fn load_triage_config(&self) -> storage::Result<Option<TriageConfig>>;
}

impl TriageStore for Storage {
    fn load_ticket(&self, id: Uuid) -> storage::Result<Ticket> {
        Storage::load_ticket(self, id)
    }

    fn save_ticket(&self, ticket: &Ticket) -> storage::Result<()> {
        Storage::update_ticket(self, ticket)
    }

    fn create_suggestion(&self, suggestion: &AgentSuggestion) -> storage::Result<()> {
        Storage::create_suggestion(self, suggestion)
    }

    fn mark_suggestion_auto_closed(&self, id: Uuid, auto_closed: bool) -> storage::Result<()> {
        Storage::mark_suggestion_auto_closed(self, id, auto_closed)
    }

    fn load_triage_config(&self) -> storage::Result<Option<TriageConfig>> {
        Storage::load_triage_config(self)
    }
}

/// The step a triage run was on when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageStep {
    Load,
    Start,
    Classify,
    Retrieve,
    Draft,
    Suggest,
    Decide,
    Save,
    Complete,
}

impl fmt::Display for TriageStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::Start => "start",
            Self::Classify => "classify",
            Self::Retrieve => "retrieve",
            Self::Draft => "draft",
            Self::Suggest => "suggest",
            Self::Decide => "decide",
            Self::Save => "save",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Why a triage run stopped.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("ticket not found: {0}")]
    NotFound(Uuid),

    #[error("triage of {ticket_id} failed at {step}: {source}")]
    Persistence {
        ticket_id: Uuid,
        step: TriageStep,
        #[source]
        source: StorageError,
    },
}

/// Where triage sent the ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    AutoClosed,
    Escalated,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AutoClosed => "auto_closed",
            Self::Escalated => "escalated",
        }
    }
}

/// A summary of one completed run.
#[derive(Debug, Clone)]
pub struct TriageReport {
    pub ticket_id: Uuid,
    pub trace_id: Uuid,
    pub suggestion_id: Uuid,
    pub category: Category,
    pub confidence: f64,
    pub outcome: Outcome,
}

/// Runs triage against a store.
pub struct Orchestrator<S> {
    store: S,
}

impl<S: TriageStore> Orchestrator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Triages one ticket.
    ///
    /// Fails with [`TriageError::NotFound`] before writing anything if the
    /// ticket doesn't exist.
    #[tracing::instrument(skip(self), fields(trace = tracing::field::Empty))]
    pub fn triage(&self, ticket_id: Uuid) -> Result<TriageReport, TriageError> {
        let at = |step: TriageStep| {
            move |source: StorageError| TriageError::Persistence {
                ticket_id,
                step,
                source,
            }
        };

        let mut ticket = match self.store.load_ticket(ticket_id) {
            Ok(ticket) => ticket,
            Err(StorageError::TicketNotFound(id)) => return Err(TriageError::NotFound(id)),
            Err(e) => return Err(at(TriageStep::Load)(e)),
        };

        let started = Instant::now();
        let trail = AuditTrail::start(&self.store, ticket.id, SYSTEM_ACTOR);
        tracing::Span::current().record("trace", tracing::field::display(trail.trace_id()));

        trail
            .record(AuditAction::TicketTriagedStarted, json!({}))
            .map_err(at(TriageStep::Start))?;

        let Classification {
            category,
            confidence,
        } = classify(&ticket.description);
        trail
            .record(
                AuditAction::AgentClassified,
                json!({ "category": category, "confidence": confidence }),
            )
            .map_err(at(TriageStep::Classify))?;

        let articles = retrieve(&self.store, category).map_err(at(TriageStep::Retrieve))?;
        let article_ids: Vec<Uuid> = articles.iter().map(|a| a.id).collect();
        trail
            .record(
                AuditAction::KbRetrieved,
                json!({ "articleIds": article_ids }),
            )
            .map_err(at(TriageStep::Retrieve))?;

        let Draft { reply, citations } = draft(&ticket.description, &articles);
        trail
            .record(
                AuditAction::DraftGenerated,
                json!({ "draftReply": reply, "citations": citations }),
            )
            .map_err(at(TriageStep::Draft))?;

        let config = self.load_config();

        let suggestion = AgentSuggestion {
            id: Uuid::new_v4(),
            ticket_id: ticket.id,
            predicted_category: category,
            article_ids: citations,
            draft_reply: reply,
            confidence,
            auto_closed: false,
            model_info: ModelInfo {
                provider: PROVIDER.to_string(),
                model: MODEL.to_string(),
                prompt_version: PROMPT_VERSION.to_string(),
                latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            },
            created_at: Timestamp::now(),
        };
        self.store
            .create_suggestion(&suggestion)
            .map_err(at(TriageStep::Suggest))?;

        let decision = decide(confidence, &config);
        let decision_meta = json!({
            "confidence": confidence,
            "threshold": config.confidence_threshold,
            "autoCloseEnabled": config.auto_close_enabled,
        });
        let outcome = if decision.auto_close {
            ticket.status = TicketStatus::Resolved;
            trail
                .record(AuditAction::AutoClosed, decision_meta)
                .map_err(at(TriageStep::Decide))?;
            Outcome::AutoClosed
        } else {
            ticket.status = TicketStatus::WaitingHuman;
            ticket.assignee = None;
            trail
                .record(AuditAction::AssignedToHuman, decision_meta)
                .map_err(at(TriageStep::Decide))?;
            Outcome::Escalated
        };

        if decision.auto_close {
            self.store
                .mark_suggestion_auto_closed(suggestion.id, true)
                .map_err(at(TriageStep::Save))?;
        }
        ticket.agent_suggestion_id = Some(suggestion.id);
        ticket.updated_at = Timestamp::now();
        self.store
            .save_ticket(&ticket)
            .map_err(at(TriageStep::Save))?;

        trail
            .record(
                AuditAction::TicketTriagedCompleted,
                json!({ "suggestionId": suggestion.id, "outcome": outcome.as_str() }),
            )
            .map_err(at(TriageStep::Complete))?;

        info!(%category, confidence, outcome = outcome.as_str(), "ticket triaged");

        Ok(TriageReport {
            ticket_id: ticket.id,
            trace_id: trail.trace_id(),
            suggestion_id: suggestion.id,
            category,
            confidence,
            outcome,
        })
    }

    /// Loads the triage config for this run, falling back to defaults.
    ///
    /// An unreadable or invalid config never fails the run.
    fn load_config(&self) -> TriageConfig {
        match self.store.load_triage_config() {
            Ok(Some(config)) => match config.validate() {
                Ok(()) => config,
                Err(e) => {
                    warn!(error = %e, "stored triage config is invalid, using defaults");
                    TriageConfig::default()
                }
            },
            Ok(None) => {
                debug!("no triage config stored, using defaults");
                TriageConfig::default()
            }
            Err(e) => {
                warn!(error = %e, "triage config unavailable, using defaults");
                TriageConfig::default()
            }
        }
    }
}
