//! Ephemeral category store used when the durable store is unavailable.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::collate::sort_by_text;
use super::store::{ensure_language, CategoryStore, StoreError};
use crate::models::CategoryRecord;

type Key = (String, String);

fn key_of(record: &CategoryRecord) -> Key {
    (record.category.clone(), record.lang.clone())
}

/// In-memory store keyed by `(category, lang)`. A single lock makes every batch atomic.
#[derive(Default)]
pub struct MemoryCategoryStore {
    records: RwLock<BTreeMap<Key, CategoryRecord>>,
}

impl MemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CategoryStore for MemoryCategoryStore {
    async fn put(&self, records: &[CategoryRecord]) -> Result<usize, StoreError> {
        let mut map = self.records.write().await;
        for record in records {
            map.insert(key_of(record), record.clone());
        }
        Ok(records.len())
    }

    async fn query_by_language(&self, lang: &str) -> Result<Vec<CategoryRecord>, StoreError> {
        let map = self.records.read().await;
        let mut records: Vec<CategoryRecord> =
            map.values().filter(|r| r.lang == lang).cloned().collect();
        sort_by_text(&mut records);
        Ok(records)
    }

    async fn query_all(&self) -> Result<Vec<CategoryRecord>, StoreError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn delete_by_language(&self, lang: &str) -> Result<usize, StoreError> {
        let mut map = self.records.write().await;
        let before = map.len();
        map.retain(|(_, record_lang), _| record_lang != lang);
        Ok(before - map.len())
    }

    async fn replace_language(
        &self,
        lang: &str,
        records: &[CategoryRecord],
    ) -> Result<usize, StoreError> {
        ensure_language(lang, records)?;

        let mut map = self.records.write().await;
        map.retain(|(_, record_lang), _| record_lang != lang);
        for record in records {
            map.insert(key_of(record), record.clone());
        }
        Ok(records.len())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.records.write().await.clear();
        Ok(())
    }

    async fn get_by_id(
        &self,
        category: &str,
        lang: &str,
    ) -> Result<Option<CategoryRecord>, StoreError> {
        let map = self.records.read().await;
        Ok(map.get(&(category.to_string(), lang.to_string())).cloned())
    }
}
