//! Agent suggestions: the persisted outcome of one triage run.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Category;

/// What triage proposed for a ticket.
///
/// One per triage run. Re-triaging writes a new suggestion rather than
/// editing this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSuggestion {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub predicted_category: Category,
    pub article_ids: Vec<Uuid>,
    pub draft_reply: String,
    pub confidence: f64,
    pub auto_closed: bool,
    pub model_info: ModelInfo,
    pub created_at: Timestamp,
}

/// Which provider produced a suggestion, and how long it took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub provider: String,
    pub model: String,
    pub prompt_version: String,
    pub latency_ms: u64,
}
