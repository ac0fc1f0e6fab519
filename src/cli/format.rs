//! Output formatting for CLI display.

use crate::model::{AgentSuggestion, Article, AuditEntry, Reply, Ticket, TriageConfig};
use crate::triage::TriageReport;

use super::short_id;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(super) fn format_ticket_line(ticket: &Ticket, overdue: bool) -> String {
    let mut line = format!(
        "{}  [{}] [{}]  {}",
        short_id(ticket.id),
        ticket.status,
        ticket.category,
        ticket.title
    );
    if let Some(assignee) = &ticket.assignee {
        line.push_str(&format!("  @{assignee}"));
    }
    if overdue {
        line.push_str("  OVERDUE");
    }
    line
}

pub(super) fn format_ticket(ticket: &Ticket) -> String {
    let mut out = format!(
        "{} ({})\n{}\n\nstatus:   {}\ncategory: {}\nopened:   {} by {}\n",
        ticket.title,
        ticket.id,
        ticket.description,
        ticket.status,
        ticket.category,
        ticket.created_at.strftime(TIME_FORMAT),
        ticket.created_by,
    );
    if let Some(assignee) = &ticket.assignee {
        out.push_str(&format!("assignee: {assignee}\n"));
    }
    out
}

/// One line per completed triage run.
pub(super) fn format_report(report: &TriageReport) -> String {
    format!(
        "{}  {}  {} ({:.2})  trace {}",
        short_id(report.ticket_id),
        report.outcome.as_str(),
        report.category,
        report.confidence,
        short_id(report.trace_id),
    )
}

pub(super) fn format_suggestion(suggestion: &AgentSuggestion) -> String {
    let verdict = if suggestion.auto_closed {
        "auto-closed"
    } else {
        "escalated"
    };
    let mut out = format!(
        "suggestion {}: {} ({:.2}), {verdict}\n",
        short_id(suggestion.id),
        suggestion.predicted_category,
        suggestion.confidence,
    );
    for line in suggestion.draft_reply.lines() {
        out.push_str(&format!("  > {line}\n"));
    }
    out.push_str(&format!(
        "  {}/{} prompt {}, {} ms\n",
        suggestion.model_info.provider,
        suggestion.model_info.model,
        suggestion.model_info.prompt_version,
        suggestion.model_info.latency_ms,
    ));
    out
}

pub(super) fn format_reply(reply: &Reply) -> String {
    format!(
        "{}  {}: {}",
        reply.created_at.strftime(TIME_FORMAT),
        reply.author,
        reply.body
    )
}

/// One audit entry. Empty metadata is left off.
pub(super) fn format_audit_entry(entry: &AuditEntry) -> String {
    let mut line = format!(
        "{}  {}  {:<24} {}",
        entry.recorded_at.strftime(TIME_FORMAT),
        short_id(entry.trace_id),
        entry.action.as_str(),
        entry.actor,
    );
    let empty = entry.meta.is_null() || entry.meta.as_object().is_some_and(|m| m.is_empty());
    if !empty {
        line.push_str(&format!("  {}", entry.meta));
    }
    line
}

pub(super) fn format_article_line(article: &Article) -> String {
    let mut line = format!(
        "{}  [{}]  {}",
        short_id(article.id),
        article.status,
        article.title
    );
    if !article.tags.is_empty() {
        line.push_str(&format!("  ({})", article.tags.join(", ")));
    }
    line
}

pub(super) fn format_config(config: &TriageConfig) -> String {
    format!(
        "auto-close: {}\nthreshold:  {:.2}\nsla-hours:  {}",
        if config.auto_close_enabled { "on" } else { "off" },
        config.confidence_threshold,
        config.sla_hours,
    )
}
