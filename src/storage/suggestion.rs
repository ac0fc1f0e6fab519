//! Suggestion storage: one row per triage run.

use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use crate::model::AgentSuggestion;

use super::{Result, Storage, StorageError, parse_enum, parse_timestamp, parse_uuid};

const SUGGESTION_COLUMNS: &str = "id, ticket_id, predicted_category, article_ids, draft_reply,
     confidence, auto_closed, model_info, created_at";

impl Storage {
    /// Inserts a new suggestion.
    pub fn create_suggestion(&self, suggestion: &AgentSuggestion) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO suggestion (id, ticket_id, predicted_category, article_ids, draft_reply,
                                     confidence, auto_closed, model_info, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                suggestion.id.to_string(),
                suggestion.ticket_id.to_string(),
                suggestion.predicted_category.as_str(),
                serde_json::to_string(&suggestion.article_ids)?,
                &suggestion.draft_reply,
                suggestion.confidence,
                suggestion.auto_closed,
                serde_json::to_string(&suggestion.model_info)?,
                suggestion.created_at.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Records the auto-close decision on a suggestion written earlier in the same run.
    ///
    /// The only column that changes after insert.
    pub fn mark_suggestion_auto_closed(&self, id: Uuid, auto_closed: bool) -> Result<()> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE suggestion SET auto_closed = ?1 WHERE id = ?2",
            rusqlite::params![auto_closed, id.to_string()],
        )?;
        if rows == 0 {
            return Err(StorageError::Corrupt(format!("suggestion {id} vanished")));
        }
        Ok(())
    }

    /// Loads a single suggestion, if it exists.
    pub fn load_suggestion(&self, id: Uuid) -> Result<Option<AgentSuggestion>> {
        let conn = self.open()?;
        conn.query_row(
            &format!("SELECT {SUGGESTION_COLUMNS} FROM suggestion WHERE id = ?1"),
            [id.to_string()],
            RawSuggestion::from_row,
        )
        .optional()?
        .map(RawSuggestion::into_suggestion)
        .transpose()
    }

    /// Every suggestion ever made for a ticket, oldest first.
    pub fn list_suggestions(&self, ticket_id: Uuid) -> Result<Vec<AgentSuggestion>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SUGGESTION_COLUMNS} FROM suggestion WHERE ticket_id = ?1 ORDER BY rowid"
        ))?;
        let raws = stmt
            .query_map([ticket_id.to_string()], RawSuggestion::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawSuggestion::into_suggestion).collect()
    }
}

/// A suggestion row as stored, before parsing.
struct RawSuggestion {
    id: String,
    ticket_id: String,
    predicted_category: String,
    article_ids: String,
    draft_reply: String,
    confidence: f64,
    auto_closed: bool,
    model_info: String,
    created_at: String,
}

impl RawSuggestion {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            ticket_id: row.get(1)?,
            predicted_category: row.get(2)?,
            article_ids: row.get(3)?,
            draft_reply: row.get(4)?,
            confidence: row.get(5)?,
            auto_closed: row.get(6)?,
            model_info: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn into_suggestion(self) -> Result<AgentSuggestion> {
        Ok(AgentSuggestion {
            id: parse_uuid(&self.id, "suggestion id")?,
            ticket_id: parse_uuid(&self.ticket_id, "suggestion ticket_id")?,
            predicted_category: parse_enum(&self.predicted_category)?,
            article_ids: serde_json::from_str(&self.article_ids)?,
            draft_reply: self.draft_reply,
            confidence: self.confidence,
            auto_closed: self.auto_closed,
            model_info: serde_json::from_str(&self.model_info)?,
            created_at: parse_timestamp(&self.created_at, "suggestion created_at")?,
        })
    }
}
