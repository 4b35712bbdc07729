//! Category store contract.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CategoryRecord, LanguageDataset, LanguageSummary};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record for '{found}' passed to a replace of language '{expected}'")]
    LanguageMismatch { expected: String, found: String },
}

/// Durable, queryable storage for category records keyed by `(category, lang)`.
///
/// Every write call is atomic as a batch.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Upsert records, possibly spanning several languages. Returns the count written.
    async fn put(&self, records: &[CategoryRecord]) -> Result<usize, StoreError>;

    /// All records of one language, sorted by `text` with locale-aware comparison.
    async fn query_by_language(&self, lang: &str) -> Result<Vec<CategoryRecord>, StoreError>;

    /// Every record across all languages, in key order.
    async fn query_all(&self) -> Result<Vec<CategoryRecord>, StoreError>;

    /// Remove every record of one language. Returns the count removed.
    async fn delete_by_language(&self, lang: &str) -> Result<usize, StoreError>;

    /// Delete a language and insert its new records in a single batch.
    async fn replace_language(
        &self,
        lang: &str,
        records: &[CategoryRecord],
    ) -> Result<usize, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;

    /// Point lookup of one category in one language.
    async fn get_by_id(
        &self,
        category: &str,
        lang: &str,
    ) -> Result<Option<CategoryRecord>, StoreError>;

    async fn dataset_for_language(&self, lang: &str) -> Result<Option<LanguageDataset>, StoreError> {
        let records = self.query_by_language(lang).await?;
        Ok(LanguageDataset::from_records(lang, records))
    }

    async fn summary(&self, lang: &str) -> Result<LanguageSummary, StoreError> {
        let records = self.query_by_language(lang).await?;
        let first = records.first();
        Ok(LanguageSummary {
            lang: lang.to_string(),
            cached_records: records.len(),
            last_updated: first.and_then(|r| r.last_updated.clone()),
            fetched_at: first.map(|r| r.fetched_at.clone()),
        })
    }
}

pub(crate) fn ensure_language(lang: &str, records: &[CategoryRecord]) -> Result<(), StoreError> {
    match records.iter().find(|r| r.lang != lang) {
        Some(stray) => Err(StoreError::LanguageMismatch {
            expected: lang.to_string(),
            found: stray.lang.clone(),
        }),
        None => Ok(()),
    }
}
