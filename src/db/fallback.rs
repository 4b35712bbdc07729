//! Store wrapper that degrades to memory when the durable store fails.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::memory::MemoryCategoryStore;
use super::store::{CategoryStore, StoreError};
use crate::models::CategoryRecord;

/// Routes each failed primary write to an ephemeral in-memory store.
///
/// A language whose last write landed in memory is served from memory alone until a
/// later write, delete or clear reaches the primary again. Every other language is
/// read from the primary, falling back to memory when the read fails.
pub struct FallbackStore {
    primary: Arc<dyn CategoryStore>,
    fallback: MemoryCategoryStore,
    in_memory: Mutex<HashSet<String>>,
}

impl FallbackStore {
    pub fn new(primary: Arc<dyn CategoryStore>) -> Self {
        Self {
            primary,
            fallback: MemoryCategoryStore::new(),
            in_memory: Mutex::new(HashSet::new()),
        }
    }

    fn languages(&self) -> MutexGuard<'_, HashSet<String>> {
        self.in_memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_in_memory(&self, lang: &str) -> bool {
        self.languages().contains(lang)
    }
}

#[async_trait]
impl CategoryStore for FallbackStore {
    async fn put(&self, records: &[CategoryRecord]) -> Result<usize, StoreError> {
        match self.primary.put(records).await {
            Ok(written) => {
                // Languages already served from memory keep receiving their writes there.
                let shadowed: Vec<CategoryRecord> = {
                    let languages = self.languages();
                    records
                        .iter()
                        .filter(|r| languages.contains(&r.lang))
                        .cloned()
                        .collect()
                };
                if !shadowed.is_empty() {
                    self.fallback.put(&shadowed).await?;
                }
                Ok(written)
            }
            Err(e) => {
                tracing::warn!("Durable store write failed, keeping records in memory: {}", e);
                let written = self.fallback.put(records).await?;
                self.languages().extend(records.iter().map(|r| r.lang.clone()));
                Ok(written)
            }
        }
    }

    async fn query_by_language(&self, lang: &str) -> Result<Vec<CategoryRecord>, StoreError> {
        if self.is_in_memory(lang) {
            return self.fallback.query_by_language(lang).await;
        }
        match self.primary.query_by_language(lang).await {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!("Durable store read failed for {}: {}", lang, e);
                self.fallback.query_by_language(lang).await
            }
        }
    }

    async fn query_all(&self) -> Result<Vec<CategoryRecord>, StoreError> {
        let ephemeral = self.fallback.query_all().await?;
        let durable = match self.primary.query_all().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Durable store scan failed: {}", e);
                return Ok(ephemeral);
            }
        };
        if ephemeral.is_empty() {
            return Ok(durable);
        }

        let languages = self.languages().clone();
        let merged: BTreeMap<(String, String), CategoryRecord> = durable
            .into_iter()
            .filter(|r| !languages.contains(&r.lang))
            .chain(ephemeral)
            .map(|r| ((r.category.clone(), r.lang.clone()), r))
            .collect();
        Ok(merged.into_values().collect())
    }

    async fn delete_by_language(&self, lang: &str) -> Result<usize, StoreError> {
        let ephemeral = self.fallback.delete_by_language(lang).await?;
        self.languages().remove(lang);
        let durable = self.primary.delete_by_language(lang).await.unwrap_or_else(|e| {
            tracing::warn!("Durable store delete failed for {}: {}", lang, e);
            0
        });
        Ok(durable + ephemeral)
    }

    async fn replace_language(
        &self,
        lang: &str,
        records: &[CategoryRecord],
    ) -> Result<usize, StoreError> {
        match self.primary.replace_language(lang, records).await {
            Ok(written) => {
                self.fallback.delete_by_language(lang).await?;
                self.languages().remove(lang);
                Ok(written)
            }
            Err(e @ StoreError::LanguageMismatch { .. }) => Err(e),
            Err(e) => {
                tracing::warn!("Durable store replace failed for {}, using memory: {}", lang, e);
                let written = self.fallback.replace_language(lang, records).await?;
                self.languages().insert(lang.to_string());
                Ok(written)
            }
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.fallback.clear().await?;
        self.languages().clear();
        if let Err(e) = self.primary.clear().await {
            tracing::warn!("Durable store clear failed: {}", e);
        }
        Ok(())
    }

    async fn get_by_id(
        &self,
        category: &str,
        lang: &str,
    ) -> Result<Option<CategoryRecord>, StoreError> {
        if self.is_in_memory(lang) {
            return self.fallback.get_by_id(category, lang).await;
        }
        match self.primary.get_by_id(category, lang).await {
            Ok(Some(record)) => Ok(Some(record)),
            Ok(None) => self.fallback.get_by_id(category, lang).await,
            Err(e) => {
                tracing::warn!("Durable store lookup failed: {}", e);
                self.fallback.get_by_id(category, lang).await
            }
        }
    }
}
