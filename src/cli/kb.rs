//! Knowledge base commands: new, search, publish, unpublish.

use clap::Subcommand;
use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{Article, ArticleStatus};
use crate::storage::Storage;

use super::format::format_article_line;
use super::{resolve_prefix, short_id};

#[derive(Debug, Subcommand)]
pub enum KbCommand {
    /// Write an article. Published unless `--draft`. Prints the article ID.
    New {
        /// Article title.
        #[arg(long)]
        title: String,

        /// A tag; repeat for several (e.g. `--tag billing --tag refund`).
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Keep the article out of triage until it is published.
        #[arg(long)]
        draft: bool,

        /// Article text.
        body: String,
    },

    /// Search articles by title, body, or tag. Lists everything without a query.
    Search {
        /// Text to look for, case-insensitive.
        query: Option<String>,

        /// Include drafts.
        #[arg(long)]
        all: bool,
    },

    /// Publish an article so triage can cite it.
    Publish {
        /// Article ID: full UUID or unambiguous prefix.
        article: String,
    },

    /// Return an article to draft.
    Unpublish {
        /// Article ID: full UUID or unambiguous prefix.
        article: String,
    },
}

pub(super) fn run(command: KbCommand, storage: &Storage) -> Result<(), String> {
    match command {
        KbCommand::New {
            title,
            tags,
            draft,
            body,
        } => {
            let status = if draft {
                ArticleStatus::Draft
            } else {
                ArticleStatus::Published
            };
            cmd_new(storage, &title, &body, &tags, status)
        }
        KbCommand::Search { query, all } => cmd_search(storage, query.as_deref(), all),
        KbCommand::Publish { article } => {
            let article = resolve_article(storage, &article)?;
            cmd_set_status(storage, &article, ArticleStatus::Published)
        }
        KbCommand::Unpublish { article } => {
            let article = resolve_article(storage, &article)?;
            cmd_set_status(storage, &article, ArticleStatus::Draft)
        }
    }
}

fn cmd_new(
    storage: &Storage,
    title: &str,
    body: &str,
    tags: &[String],
    status: ArticleStatus,
) -> Result<(), String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("article title is required".to_string());
    }

    let tags = tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let article = Article {
        id: Uuid::new_v4(),
        title: title.to_string(),
        body: body.trim().to_string(),
        tags,
        status,
        updated_at: Timestamp::now(),
    };
    storage
        .create_article(&article)
        .map_err(|e| format!("failed to create article: {e}"))?;

    println!("{}", article.id);
    Ok(())
}

fn cmd_search(storage: &Storage, query: Option<&str>, include_drafts: bool) -> Result<(), String> {
    let articles = match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => storage.search_articles(query, include_drafts),
        None => storage.list_articles().map(|articles| {
            articles
                .into_iter()
                .filter(|a| include_drafts || a.status == ArticleStatus::Published)
                .collect()
        }),
    }
    .map_err(|e| format!("failed to search articles: {e}"))?;

    if articles.is_empty() {
        println!("No articles");
        return Ok(());
    }
    for article in &articles {
        println!("{}", format_article_line(article));
    }
    Ok(())
}

fn cmd_set_status(storage: &Storage, article: &Article, status: ArticleStatus) -> Result<(), String> {
    let short = short_id(article.id);
    if article.status == status {
        eprintln!("Article {short} is already {status}");
        return Ok(());
    }

    storage
        .set_article_status(article.id, status)
        .map_err(|e| format!("failed to update article: {e}"))?;
    eprintln!("Article {short} is now {status}");
    Ok(())
}

/// Resolve an article reference (full UUID or unambiguous prefix).
fn resolve_article(storage: &Storage, reference: &str) -> Result<Article, String> {
    if let Ok(id) = reference.parse::<Uuid>() {
        return storage
            .load_article(id)
            .map_err(|e| format!("failed to load article: {e}"));
    }

    let articles = storage
        .list_articles()
        .map_err(|e| format!("failed to list articles: {e}"))?;
    resolve_prefix(&articles, |a| a.id, reference, "article").cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::tests::test_storage;

    #[test]
    fn new_article_normalizes_tags() {
        let (_dir, storage) = test_storage();

        cmd_new(
            &storage,
            " Refund policy ",
            "Refunds take 5 days.",
            &["Billing".to_string(), " ".to_string(), "refund".to_string()],
            ArticleStatus::Published,
        )
        .unwrap();

        let articles = storage.list_articles().unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Refund policy");
        assert_eq!(articles[0].tags, vec!["billing", "refund"]);
    }

    #[test]
    fn blank_title_is_rejected() {
        let (_dir, storage) = test_storage();
        assert!(cmd_new(&storage, "  ", "Body", &[], ArticleStatus::Draft).is_err());
        assert!(storage.list_articles().unwrap().is_empty());
    }

    #[test]
    fn publish_by_prefix() {
        let (_dir, storage) = test_storage();
        cmd_new(&storage, "Shipping times", "Allow 5 days.", &[], ArticleStatus::Draft)
            .unwrap();
        let draft = storage.list_articles().unwrap().remove(0);

        let article = resolve_article(&storage, &draft.id.to_string()[..5]).unwrap();
        cmd_set_status(&storage, &article, ArticleStatus::Published).unwrap();

        assert_eq!(
            storage.load_article(draft.id).unwrap().status,
            ArticleStatus::Published
        );
    }
}
