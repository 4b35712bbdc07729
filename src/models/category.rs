//! Category models shared by the store, the sync service and the API.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A category as delivered by the upstream API: identifier plus display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryItem {
    pub category: String,
    pub text: String,
}

/// A cached category row. The same `category` id recurs once per language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub category: String,
    pub lang: String,
    pub text: String,
    /// Server-side generation time of the dataset this record came from.
    pub last_updated: Option<String>,
    /// Client-side time the record was cached.
    pub fetched_at: String,
}

/// One page of the upstream category listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPage {
    #[serde(default)]
    pub items: Vec<CategoryItem>,
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Upstream metadata document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub categories_last_updated: Option<String>,
}

/// All categories of one language, the unit handed to callers and replaced by refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDataset {
    pub lang: String,
    pub items: Vec<CategoryItem>,
    pub last_updated: Option<String>,
    pub fetched_at: String,
}

impl LanguageDataset {
    /// Rebuild a dataset from cached rows. Timestamps come from the first row.
    pub fn from_records(lang: &str, records: Vec<CategoryRecord>) -> Option<Self> {
        let first = records.first()?;
        let last_updated = first.last_updated.clone();
        let fetched_at = first.fetched_at.clone();

        let items = records
            .into_iter()
            .map(|record| CategoryItem {
                category: record.category,
                text: record.text,
            })
            .collect();

        Some(Self {
            lang: lang.to_string(),
            items,
            last_updated,
            fetched_at,
        })
    }

    /// Flatten into store rows stamped with this dataset's language and timestamps.
    pub fn to_records(&self) -> Vec<CategoryRecord> {
        self.items
            .iter()
            .map(|item| CategoryRecord {
                category: item.category.clone(),
                lang: self.lang.clone(),
                text: item.text.clone(),
                last_updated: self.last_updated.clone(),
                fetched_at: self.fetched_at.clone(),
            })
            .collect()
    }
}

/// Cache status of a single language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSummary {
    pub lang: String,
    pub cached_records: usize,
    pub last_updated: Option<String>,
    pub fetched_at: Option<String>,
}

/// Current UTC time as an ISO-8601 string with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
