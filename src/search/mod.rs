//! Ranked category search over the local cache.
//!
//! Matches are graded into four tiers (exact, prefix, substring, fuzzy subsequence)
//! against both the category id and its display text. Search never touches the network.

mod fuzzy;

pub use fuzzy::fuzzy_score;

use std::sync::Arc;

use serde::Serialize;

use crate::db::{CategoryStore, StoreError};
use crate::models::CategoryRecord;

/// Terms shorter than this (after trimming) yield no results.
pub const DEFAULT_MIN_LENGTH: usize = 2;

/// Lowest fuzzy score that still counts as a match.
pub const FUZZY_THRESHOLD: u8 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    Exact,
    StartsWith,
    Contains,
    Fuzzy,
}

impl MatchType {
    /// Sort rank, higher first.
    pub fn rank(self) -> u8 {
        match self {
            MatchType::Exact => 4,
            MatchType::StartsWith => 3,
            MatchType::Contains => 2,
            MatchType::Fuzzy => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchedField {
    Category,
    Text,
}

/// A cached record annotated with how it matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedMatch {
    #[serde(flatten)]
    pub record: CategoryRecord,
    pub match_score: u8,
    pub match_type: MatchType,
    pub matched_field: MatchedField,
    pub search_term: String,
}

type FieldTest = fn(&str, &str) -> bool;

const TIERS: [(MatchType, u8, FieldTest); 3] = [
    (MatchType::Exact, 100, |field, term| field == term),
    (MatchType::StartsWith, 95, |field, term| field.starts_with(term)),
    (MatchType::Contains, 85, |field, term| field.contains(term)),
];

/// Grade one record against a lower-cased term.
fn classify(term: &str, record: &CategoryRecord) -> Option<(MatchType, u8, MatchedField)> {
    let category = record.category.to_lowercase();
    let text = record.text.to_lowercase();
    let fields = [
        (MatchedField::Category, category.as_str()),
        (MatchedField::Text, text.as_str()),
    ];

    for (match_type, score, test) in TIERS {
        if let Some((field, _)) = fields.iter().find(|(_, value)| test(value, term)) {
            return Some((match_type, score, *field));
        }
    }

    let category_score = fuzzy_score(term, &category);
    let text_score = fuzzy_score(term, &text);
    let (field, score) = if category_score >= text_score {
        (MatchedField::Category, category_score)
    } else {
        (MatchedField::Text, text_score)
    };

    (score >= FUZZY_THRESHOLD).then_some((MatchType::Fuzzy, score, field))
}

/// Rank `records` against `term`. Best tier first, then highest score; ties keep input order.
pub fn rank_matches(term: &str, records: Vec<CategoryRecord>, min_length: usize) -> Vec<RankedMatch> {
    let trimmed = term.trim();
    if trimmed.chars().count() < min_length.max(1) {
        return Vec::new();
    }
    let needle = trimmed.to_lowercase();

    let mut matches: Vec<RankedMatch> = records
        .into_iter()
        .filter_map(|record| {
            let (match_type, match_score, matched_field) = classify(&needle, &record)?;
            Some(RankedMatch {
                record,
                match_score,
                match_type,
                matched_field,
                search_term: term.to_string(),
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.match_type
            .rank()
            .cmp(&a.match_type.rank())
            .then(b.match_score.cmp(&a.match_score))
    });
    matches
}

/// Search front end over a category store.
pub struct CategorySearch {
    store: Arc<dyn CategoryStore>,
    default_min_length: usize,
}

impl CategorySearch {
    pub fn new(store: Arc<dyn CategoryStore>) -> Self {
        Self {
            store,
            default_min_length: DEFAULT_MIN_LENGTH,
        }
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.default_min_length = min_length;
        self
    }

    /// Search every cached record across all languages.
    pub async fn search(
        &self,
        term: &str,
        min_length: Option<usize>,
    ) -> Result<Vec<RankedMatch>, StoreError> {
        let min_length = min_length.unwrap_or(self.default_min_length);
        if term.trim().chars().count() < min_length.max(1) {
            return Ok(Vec::new());
        }

        let records = self.store.query_all().await?;
        let matches = rank_matches(term, records, min_length);
        tracing::debug!("Search {:?} matched {} record(s)", term, matches.len());
        Ok(matches)
    }
}
