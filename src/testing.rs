//! Test doubles shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::db::{CategoryStore, MemoryCategoryStore, StoreError};
use crate::models::{CategoryItem, CategoryPage, CategoryRecord, Metadata};
use crate::remote::{CategorySource, RemoteError};

pub const TEST_LAST_UPDATED: &str = "2024-05-01T00:00:00.000Z";
pub const TEST_FETCHED_AT: &str = "2024-05-02T00:00:00.000Z";

pub fn record(category: &str, lang: &str, text: &str) -> CategoryRecord {
    CategoryRecord {
        category: category.to_string(),
        lang: lang.to_string(),
        text: text.to_string(),
        last_updated: Some(TEST_LAST_UPDATED.to_string()),
        fetched_at: TEST_FETCHED_AT.to_string(),
    }
}

/// Memory store that can be switched into failing every call.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryCategoryStore,
    broken: AtomicBool,
}

impl FlakyStore {
    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn broken() -> Self {
        let store = Self::default();
        store.set_broken(true);
        store
    }

    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for FlakyStore {
    async fn put(&self, records: &[CategoryRecord]) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.put(records).await
    }

    async fn query_by_language(&self, lang: &str) -> Result<Vec<CategoryRecord>, StoreError> {
        self.check()?;
        self.inner.query_by_language(lang).await
    }

    async fn query_all(&self) -> Result<Vec<CategoryRecord>, StoreError> {
        self.check()?;
        self.inner.query_all().await
    }

    async fn delete_by_language(&self, lang: &str) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.delete_by_language(lang).await
    }

    async fn replace_language(
        &self,
        lang: &str,
        records: &[CategoryRecord],
    ) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.replace_language(lang, records).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.check()?;
        self.inner.clear().await
    }

    async fn get_by_id(
        &self,
        category: &str,
        lang: &str,
    ) -> Result<Option<CategoryRecord>, StoreError> {
        self.check()?;
        self.inner.get_by_id(category, lang).await
    }
}

/// Scripted upstream. Pages of one language are chained with `page-N` tokens.
pub struct FakeSource {
    pages: Mutex<HashMap<String, Vec<CategoryPage>>>,
    metadata: Mutex<Option<Metadata>>,
    failing: AtomicBool,
    latency: Mutex<Duration>,
    page_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
}

impl Default for FakeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            metadata: Mutex::new(Some(Metadata::default())),
            failing: AtomicBool::new(false),
            latency: Mutex::new(Duration::ZERO),
            page_calls: AtomicUsize::new(0),
            metadata_calls: AtomicUsize::new(0),
        }
    }

    /// Replace the listing of `lang`. Every page carries `last_updated`.
    pub fn set_pages(&self, lang: &str, last_updated: &str, pages: &[&[(&str, &str)]]) {
        let count = pages.len();
        let pages = pages
            .iter()
            .enumerate()
            .map(|(index, items)| CategoryPage {
                items: items
                    .iter()
                    .map(|(category, text)| CategoryItem {
                        category: category.to_string(),
                        text: text.to_string(),
                    })
                    .collect(),
                next_token: (index + 1 < count).then(|| format!("page-{}", index + 1)),
                last_updated: Some(last_updated.to_string()),
            })
            .collect();
        self.pages.lock().unwrap().insert(lang.to_string(), pages);
    }

    pub fn set_metadata(&self, categories_last_updated: Option<&str>) {
        *self.metadata.lock().unwrap() = Some(Metadata {
            categories_last_updated: categories_last_updated.map(str::to_string),
        });
    }

    pub fn fail_metadata(&self) {
        *self.metadata.lock().unwrap() = None;
    }

    /// Make every page fetch fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl CategorySource for FakeSource {
    async fn fetch_category_page(
        &self,
        lang: &str,
        next_token: Option<&str>,
    ) -> Result<CategoryPage, RemoteError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Status(503));
        }

        let index = next_token
            .and_then(|token| token.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let pages = self.pages.lock().unwrap();
        Ok(pages
            .get(lang)
            .and_then(|pages| pages.get(index))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_metadata(&self) -> Result<Metadata, RemoteError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        self.metadata
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| RemoteError::GraphQl("metadata unavailable".to_string()))
    }
}
