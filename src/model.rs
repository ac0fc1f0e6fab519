//! Core data model for the helpdesk.
//!
//! Tickets and their replies, knowledge base articles, the suggestions
//! triage produces, the audit trail, and the triage policy.

mod article;
mod audit;
mod policy;
mod suggestion;
mod ticket;

pub use article::{Article, ArticleStatus};
pub use audit::{AuditAction, AuditEntry, SYSTEM_ACTOR};
pub use policy::TriageConfig;
pub use suggestion::{AgentSuggestion, ModelInfo};
pub use ticket::{Category, Reply, Ticket, TicketStatus};
