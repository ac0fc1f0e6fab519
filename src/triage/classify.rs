//! Ticket classification: an ordered keyword rule table.
//!
//! Rules are checked top to bottom and the first match wins. Matching is a
//! case-insensitive substring search, the same policy the retriever uses.

use crate::model::Category;

/// One row of the rule table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub keywords: &'static [&'static str],
    pub category: Category,
    pub confidence: f64,
}

impl Rule {
    /// `lowered` must already be lowercase.
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

/// The result of classifying a ticket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub category: Category,
    pub confidence: f64,
}

pub const RULES: [Rule; 3] = [
    Rule {
        keywords: &["refund", "invoice"],
        category: Category::Billing,
        confidence: 0.90,
    },
    Rule {
        keywords: &["error", "bug", "stack"],
        category: Category::Tech,
        confidence: 0.80,
    },
    Rule {
        keywords: &["delivery", "shipment"],
        category: Category::Shipping,
        confidence: 0.85,
    },
];

/// Used when no rule matches.
pub const FALLBACK: Classification = Classification {
    category: Category::Other,
    confidence: 0.50,
};

/// Classifies ticket text with the built-in rule table.
pub fn classify(text: &str) -> Classification {
    classify_with(&RULES, text)
}

/// Classifies ticket text with a caller-supplied rule table.
pub fn classify_with(rules: &[Rule], text: &str) -> Classification {
    let lowered = text.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map_or(FALLBACK, |rule| Classification {
            category: rule.category,
            confidence: rule.confidence,
        })
}
