//! Reply drafting.

use uuid::Uuid;

use crate::model::Article;

/// A draft reply and the articles it cites, in citation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub reply: String,
    pub citations: Vec<Uuid>,
}

/// Drafts a reply that restates the query and lists each article.
pub fn draft(text: &str, articles: &[Article]) -> Draft {
    let reply = if articles.is_empty() {
        format!(
            "Based on your query: {text}. No knowledge base articles matched; \
             an agent will follow up."
        )
    } else {
        let references = articles
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{}. {} (ID: {})", i + 1, a.title, a.id))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Based on your query: {text}. Here are references:\n{references}")
    };

    Draft {
        reply,
        citations: articles.iter().map(|a| a.id).collect(),
    }
}
