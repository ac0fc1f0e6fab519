//! Knowledge retrieval: pick the published articles most relevant to a category.

use crate::model::{Article, ArticleStatus, Category};
use crate::storage::{self, Storage};

/// Upper bound on articles returned per triage run.
pub const MAX_ARTICLES: usize = 3;

/// Where candidate articles come from.
pub trait ArticleSource {
    /// Published articles matching `keyword` in title, body, or tags.
    fn find_published_articles(&self, keyword: &str) -> storage::Result<Vec<Article>>;
}

impl ArticleSource for Storage {
    fn find_published_articles(&self, keyword: &str) -> storage::Result<Vec<Article>> {
        Storage::find_published_articles(self, keyword)
    }
}

/// Returns at most [`MAX_ARTICLES`] published articles for `category`, best first.
pub fn retrieve<S: ArticleSource + ?Sized>(
    source: &S,
    category: Category,
) -> storage::Result<Vec<Article>> {
    let candidates = source.find_published_articles(category.as_str())?;
    Ok(rank(category, candidates))
}

/// Scores, orders, and truncates candidate articles.
///
/// A tag match outweighs a title match, which outweighs a body match.
/// Ties go to the most recently updated article, then to the lowest id, so
/// the order is stable for a fixed data set.
pub fn rank(category: Category, candidates: Vec<Article>) -> Vec<Article> {
    let keyword = category.as_str();
    let mut scored: Vec<(u32, Article)> = candidates
        .into_iter()
        .filter(|a| a.status == ArticleStatus::Published)
        .filter_map(|a| {
            let score = relevance(keyword, &a);
            (score > 0).then_some((score, a))
        })
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .cmp(score_a)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    scored
        .into_iter()
        .take(MAX_ARTICLES)
        .map(|(_, article)| article)
        .collect()
}

fn relevance(keyword: &str, article: &Article) -> u32 {
    let mut score = 0;
    if article.tags.iter().any(|t| t.eq_ignore_ascii_case(keyword)) {
        score += 3;
    }
    if article.title.to_lowercase().contains(keyword) {
        score += 2;
    }
    if article.body.to_lowercase().contains(keyword) {
        score += 1;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use uuid::Uuid;

    use crate::storage::tests::{sample_article, test_storage};

    fn at(seconds: i64) -> Timestamp {
        Timestamp::new(seconds, 0).unwrap()
    }

    #[test]
    fn never_returns_drafts() {
        let candidates = vec![
            sample_article("Billing draft", &["billing"], ArticleStatus::Draft),
            sample_article("Billing live", &["billing"], ArticleStatus::Published),
        ];

        let ranked = rank(Category::Billing, candidates);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].title, "Billing live");
    }

    #[test]
    fn at_most_three() {
        let candidates = (0..5)
            .map(|i| sample_article(&format!("Billing {i}"), &["billing"], ArticleStatus::Published))
            .collect();

        assert_eq!(rank(Category::Billing, candidates).len(), MAX_ARTICLES);
    }

    #[test]
    fn tag_beats_title_beats_body() {
        let mut body_only = sample_article("Invoices", &[], ArticleStatus::Published);
        body_only.body = "Billing happens monthly.".into();
        let title_only = sample_article("Billing FAQ", &[], ArticleStatus::Published);
        let tagged = sample_article("Payment methods", &["Billing"], ArticleStatus::Published);

        let ranked = rank(
            Category::Billing,
            vec![body_only.clone(), title_only.clone(), tagged.clone()],
        );

        let ids: Vec<Uuid> = ranked.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![tagged.id, title_only.id, body_only.id]);
    }

    #[test]
    fn ties_prefer_recent_then_lowest_id() {
        let mut old = sample_article("Shipping A", &["shipping"], ArticleStatus::Published);
        old.updated_at = at(1_000);
        let mut new_a = sample_article("Shipping B", &["shipping"], ArticleStatus::Published);
        new_a.updated_at = at(2_000);
        let mut new_b = sample_article("Shipping C", &["shipping"], ArticleStatus::Published);
        new_b.updated_at = at(2_000);

        let (low, high) = if new_a.id < new_b.id {
            (new_a.id, new_b.id)
        } else {
            (new_b.id, new_a.id)
        };

        let ranked = rank(Category::Shipping, vec![old.clone(), new_a, new_b]);
        let ids: Vec<Uuid> = ranked.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![low, high, old.id]);
    }

    #[test]
    fn nothing_matching_is_empty_not_error() {
        let (_dir, storage) = test_storage();
        storage
            .create_article(&sample_article("Tracking", &["shipping"], ArticleStatus::Published))
            .unwrap();

        let found = retrieve(&storage, Category::Other).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn retrieve_reads_from_storage() {
        let (_dir, storage) = test_storage();
        let billing = sample_article(
            "How to update payment method",
            &["billing", "payments"],
            ArticleStatus::Published,
        );
        storage.create_article(&billing).unwrap();
        storage
            .create_article(&sample_article("Billing draft", &["billing"], ArticleStatus::Draft))
            .unwrap();

        let found = retrieve(&storage, Category::Billing).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, billing.id);
    }
}
