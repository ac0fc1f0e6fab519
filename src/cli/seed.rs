//! Sample data for a fresh database.

use jiff::Timestamp;
use uuid::Uuid;

use crate::desk::{self, NewTicket};
use crate::model::{Article, ArticleStatus, Category};
use crate::storage::Storage;

use super::triage_tickets;

/// Who files the sample tickets.
const SAMPLE_REQUESTER: &str = "user@example.com";

const ARTICLES: [(&str, &str, &[&str]); 3] = [
    (
        "How to update payment method",
        "Update via settings...",
        &["billing", "payments"],
    ),
    (
        "Troubleshooting 500 errors",
        "Check logs...",
        &["tech", "errors"],
    ),
    (
        "Tracking your shipment",
        "Use tracking ID...",
        &["shipping", "delivery"],
    ),
];

const TICKETS: [(&str, &str, Category); 3] = [
    (
        "Refund for double charge",
        "Charged twice for order #1234",
        Category::Billing,
    ),
    (
        "App shows 500 on login",
        "Stack trace mentions auth module",
        Category::Tech,
    ),
    (
        "Where is my package?",
        "Shipment delayed 5 days",
        Category::Shipping,
    ),
];

/// Seeds an empty database, then triages the sample tickets.
pub(super) async fn run(storage: &Storage) -> Result<(), String> {
    let ticket_ids = insert(storage)?;
    eprintln!(
        "Seeded {} articles and {} tickets",
        ARTICLES.len(),
        ticket_ids.len()
    );
    triage_tickets(storage, &ticket_ids).await
}

fn insert(storage: &Storage) -> Result<Vec<Uuid>, String> {
    let has_tickets = !storage
        .list_tickets()
        .map_err(|e| format!("failed to list tickets: {e}"))?
        .is_empty();
    let has_articles = !storage
        .list_articles()
        .map_err(|e| format!("failed to list articles: {e}"))?
        .is_empty();
    if has_tickets || has_articles {
        return Err("database already has data; seed only runs on an empty one".into());
    }

    for (title, body, tags) in ARTICLES {
        let article = Article {
            id: Uuid::new_v4(),
            title: title.to_string(),
            body: body.to_string(),
            tags: tags.iter().map(ToString::to_string).collect(),
            status: ArticleStatus::Published,
            updated_at: Timestamp::now(),
        };
        storage
            .create_article(&article)
            .map_err(|e| format!("failed to create article: {e}"))?;
    }

    TICKETS
        .into_iter()
        .map(|(title, description, category)| {
            let new = NewTicket {
                title: title.to_string(),
                description: description.to_string(),
                category: Some(category),
            };
            desk::open_ticket(storage, new, SAMPLE_REQUESTER)
                .map(|ticket| ticket.id)
                .map_err(|e| format!("failed to open ticket: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::TicketStatus;
    use crate::storage::tests::test_storage;

    #[test]
    fn seeds_articles_and_open_tickets() {
        let (_dir, storage) = test_storage();

        let ids = insert(&storage).unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(storage.list_articles().unwrap().len(), 3);
        for id in ids {
            let ticket = storage.load_ticket(id).unwrap();
            assert_eq!(ticket.status, TicketStatus::Open);
            assert_eq!(ticket.created_by, SAMPLE_REQUESTER);
        }
    }

    #[test]
    fn refuses_a_database_with_data() {
        let (_dir, storage) = test_storage();
        insert(&storage).unwrap();

        assert!(insert(&storage).is_err());
        assert_eq!(storage.list_tickets().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn seeded_tickets_are_triaged_on_their_descriptions() {
        let (_dir, storage) = test_storage();

        run(&storage).await.unwrap();

        let statuses: Vec<(String, TicketStatus)> = storage
            .list_tickets()
            .unwrap()
            .into_iter()
            .map(|t| (t.title, t.status))
            .collect();
        // "Charged twice for order #1234" has no billing keyword.
        assert!(statuses.contains(&(
            "Refund for double charge".into(),
            TicketStatus::WaitingHuman
        )));
        assert!(statuses.contains(&("App shows 500 on login".into(), TicketStatus::Resolved)));
        assert!(statuses.contains(&("Where is my package?".into(), TicketStatus::Resolved)));
    }
}
