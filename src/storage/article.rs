//! Knowledge base storage.
//!
//! Tags are stored as a JSON array. Matching is case-insensitive throughout,
//! with Unicode case folding, so it runs over loaded rows rather than in SQL.

use jiff::Timestamp;
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use crate::model::{Article, ArticleStatus};

use super::{Result, Storage, StorageError, parse_enum, parse_timestamp, parse_uuid};

const ARTICLE_COLUMNS: &str = "id, title, body, tags, status, updated_at";

impl Storage {
    /// Inserts a new article.
    pub fn create_article(&self, article: &Article) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO article (id, title, body, tags, status, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                article.id.to_string(),
                &article.title,
                &article.body,
                serde_json::to_string(&article.tags)?,
                article.status.as_str(),
                article.updated_at.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Loads a single article.
    pub fn load_article(&self, id: Uuid) -> Result<Article> {
        let conn = self.open()?;
        let raw = conn
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM article WHERE id = ?1"),
                [id.to_string()],
                RawArticle::from_row,
            )
            .optional()?
            .ok_or(StorageError::ArticleNotFound(id))?;
        raw.into_article()
    }

    /// Publishes or unpublishes an article, bumping its `updated_at`.
    pub fn set_article_status(&self, id: Uuid, status: ArticleStatus) -> Result<()> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE article SET status = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![status.as_str(), Timestamp::now().to_string(), id.to_string()],
        )?;
        if rows == 0 {
            return Err(StorageError::ArticleNotFound(id));
        }
        Ok(())
    }

    /// Lists every article, drafts included.
    pub fn list_articles(&self) -> Result<Vec<Article>> {
        self.query_articles(&format!("SELECT {ARTICLE_COLUMNS} FROM article"), &[])
    }

    /// Published articles whose title or body contains `keyword`, or that
    /// carry `keyword` as a tag. Unordered.
    pub fn find_published_articles(&self, keyword: &str) -> Result<Vec<Article>> {
        let keyword = keyword.to_lowercase();
        let mut articles = self.query_articles(
            &format!("SELECT {ARTICLE_COLUMNS} FROM article WHERE status = 'published'"),
            &[],
        )?;
        articles.retain(|a| {
            contains_folded(&a.title, &keyword)
                || contains_folded(&a.body, &keyword)
                || a.tags.iter().any(|t| t.to_lowercase() == keyword)
        });
        Ok(articles)
    }

    /// Free-text search across title, body, and tags.
    ///
    /// Drafts are only included when `include_drafts` is set.
    pub fn search_articles(&self, query: &str, include_drafts: bool) -> Result<Vec<Article>> {
        let query = query.to_lowercase();
        let mut articles = self.list_articles()?;
        articles.retain(|a| {
            (include_drafts || a.status == ArticleStatus::Published)
                && (contains_folded(&a.title, &query)
                    || contains_folded(&a.body, &query)
                    || a.tags.iter().any(|t| contains_folded(t, &query)))
        });
        articles.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(articles)
    }

    fn query_articles(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Article>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(sql)?;
        let raws = stmt
            .query_map(params, RawArticle::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawArticle::into_article).collect()
    }
}

/// Case-insensitive substring match. `needle` must already be lowercase.
///
/// Done in Rust: `SQLite`'s `lower()` only folds ASCII.
fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// An article row as stored, before parsing.
struct RawArticle {
    id: String,
    title: String,
    body: String,
    tags: String,
    status: String,
    updated_at: String,
}

impl RawArticle {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            body: row.get(2)?,
            tags: row.get(3)?,
            status: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_article(self) -> Result<Article> {
        Ok(Article {
            id: parse_uuid(&self.id, "article id")?,
            title: self.title,
            body: self.body,
            tags: serde_json::from_str(&self.tags)?,
            status: parse_enum(&self.status)?,
            updated_at: parse_timestamp(&self.updated_at, "updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::tests::{sample_article, test_storage};

    #[test]
    fn create_and_load_article() {
        let (_dir, storage) = test_storage();
        let article = sample_article(
            "How to update payment method",
            &["billing", "payments"],
            ArticleStatus::Published,
        );

        storage.create_article(&article).unwrap();
        let loaded = storage.load_article(article.id).unwrap();

        assert_eq!(loaded.title, article.title);
        assert_eq!(loaded.tags, vec!["billing", "payments"]);
        assert_eq!(loaded.status, ArticleStatus::Published);
    }

    #[test]
    fn load_nonexistent_article_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.load_article(Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, StorageError::ArticleNotFound(_)));
    }

    #[test]
    fn find_published_matches_title_body_or_tag() {
        let (_dir, storage) = test_storage();
        let by_tag = sample_article("Payment methods", &["billing"], ArticleStatus::Published);
        let by_title = sample_article("Billing FAQ", &[], ArticleStatus::Published);
        let mut by_body = sample_article("Invoices", &[], ArticleStatus::Published);
        by_body.body = "Every BILLING cycle ends on the 1st.".into();
        let unrelated = sample_article("Tracking", &["shipping"], ArticleStatus::Published);

        for a in [&by_tag, &by_title, &by_body, &unrelated] {
            storage.create_article(a).unwrap();
        }

        let found = storage.find_published_articles("billing").unwrap();
        let mut ids: Vec<Uuid> = found.iter().map(|a| a.id).collect();
        ids.sort();
        let mut expected = vec![by_tag.id, by_title.id, by_body.id];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn find_published_skips_drafts() {
        let (_dir, storage) = test_storage();
        let draft = sample_article("Billing draft", &["billing"], ArticleStatus::Draft);
        storage.create_article(&draft).unwrap();

        assert!(storage.find_published_articles("billing").unwrap().is_empty());
    }

    #[test]
    fn tag_match_is_whole_tag() {
        let (_dir, storage) = test_storage();
        let article = sample_article("Unrelated", &["billing-legacy"], ArticleStatus::Published);
        storage.create_article(&article).unwrap();

        assert!(storage.find_published_articles("billing").unwrap().is_empty());
    }

    #[test]
    fn publish_makes_article_retrievable() {
        let (_dir, storage) = test_storage();
        let draft = sample_article("Shipping times", &["shipping"], ArticleStatus::Draft);
        storage.create_article(&draft).unwrap();

        storage
            .set_article_status(draft.id, ArticleStatus::Published)
            .unwrap();

        let found = storage.find_published_articles("shipping").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, draft.id);
    }

    #[test]
    fn set_status_of_nonexistent_article_fails() {
        let (_dir, storage) = test_storage();
        let err = storage
            .set_article_status(Uuid::new_v4(), ArticleStatus::Published)
            .unwrap_err();

        assert!(matches!(err, StorageError::ArticleNotFound(_)));
    }

    #[test]
    fn search_hides_drafts_unless_asked() {
        let (_dir, storage) = test_storage();
        let published = sample_article("Reset your password", &["account"], ArticleStatus::Published);
        let draft = sample_article("Password policy", &["account"], ArticleStatus::Draft);
        storage.create_article(&published).unwrap();
        storage.create_article(&draft).unwrap();

        let visible = storage.search_articles("PASSWORD", false).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, published.id);

        let all = storage.search_articles("password", true).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Password policy");
    }

    #[test]
    fn matching_folds_non_ascii_case() {
        let (_dir, storage) = test_storage();
        let mut article = sample_article("Über Rückerstattung", &["Ärger"], ArticleStatus::Published);
        article.body = "Die ERSTATTUNG dauert fünf Tage.".into();
        storage.create_article(&article).unwrap();

        let by_title = storage.search_articles("über", false).unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].id, article.id);
        assert_eq!(storage.search_articles("RÜCK", false).unwrap().len(), 1);
        assert_eq!(storage.search_articles("ärger", false).unwrap().len(), 1);
        assert_eq!(storage.find_published_articles("über").unwrap().len(), 1);
        assert_eq!(storage.find_published_articles("ärger").unwrap().len(), 1);
    }
}
