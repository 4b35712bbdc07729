//! Cache-or-fetch entry point for per-language category datasets.
//!
//! Concurrent loads of one language share a single upstream fetch. Staleness checks
//! and refreshes run as detached tasks whose errors are logged and dropped.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio_util::task::TaskTracker;

use super::SyncError;
use crate::db::CategoryStore;
use crate::models::{
    now_timestamp, CategoryPage, CategoryRecord, LanguageDataset, LanguageSummary, Metadata,
    UserLocale,
};
use crate::remote::CategorySource;

type PendingLoad = Shared<BoxFuture<'static, Result<LanguageDataset, SyncError>>>;

/// Result of a staleness check for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCheck {
    UpToDate,
    RefreshScheduled,
    RefreshInProgress,
}

struct Inner {
    store: Arc<dyn CategoryStore>,
    source: Arc<dyn CategorySource>,
    default_locale: UserLocale,
    max_pages: usize,
    /// Languages requested since the last reset; the background sweep watches these.
    loaded_languages: Mutex<BTreeSet<String>>,
    in_flight: Mutex<HashMap<String, PendingLoad>>,
    refreshing: Mutex<HashSet<String>>,
    tasks: TaskTracker,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs the wrapped closure when dropped, including on panic or abort.
struct OnDrop<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Drop for OnDrop<F> {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

/// Parse an ISO-8601 timestamp. Forms without an offset are read as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn is_newer(remote: &str, local: &str) -> bool {
    match (parse_timestamp(remote), parse_timestamp(local)) {
        (Some(remote), Some(local)) => remote > local,
        _ => {
            tracing::warn!(
                "Cannot compare timestamps {:?} and {:?}, keeping cache",
                remote,
                local
            );
            false
        }
    }
}

/// Category sync service. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CategorySyncService {
    inner: Arc<Inner>,
}

impl CategorySyncService {
    pub fn new(
        store: Arc<dyn CategoryStore>,
        source: Arc<dyn CategorySource>,
        default_locale: UserLocale,
        max_pages: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                source,
                default_locale,
                max_pages: max_pages.max(1),
                loaded_languages: Mutex::new(BTreeSet::new()),
                in_flight: Mutex::new(HashMap::new()),
                refreshing: Mutex::new(HashSet::new()),
                tasks: TaskTracker::new(),
            }),
        }
    }

    pub fn default_language(&self) -> &str {
        &self.inner.default_locale.lang
    }

    fn resolve_language(&self, lang: Option<&str>) -> String {
        lang.map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| self.inner.default_locale.lang.clone())
    }

    fn mark_loaded(&self, lang: &str) {
        if lock(&self.inner.loaded_languages).insert(lang.to_string()) {
            tracing::info!("Language {} loaded for the first time", lang);
        }
    }

    /// Categories for `lang` (or the default language).
    ///
    /// A cached dataset is returned without waiting on the network and a staleness
    /// check is scheduled behind it. Without a cache the call blocks on a full fetch.
    pub async fn get_categories(&self, lang: Option<&str>) -> Result<LanguageDataset, SyncError> {
        let lang = self.resolve_language(lang);

        let pending = lock(&self.inner.in_flight).get(&lang).cloned();
        if let Some(pending) = pending {
            tracing::debug!("Already loading categories for {}, waiting", lang);
            return pending.await;
        }

        self.mark_loaded(&lang);

        if let Some(cached) = self.cached_dataset(&lang).await {
            tracing::info!("Cache hit for {} ({} categories)", lang, cached.items.len());
            self.spawn_update_check(&lang);
            return Ok(cached);
        }

        self.load(&lang).await
    }

    /// Join the load already running for `lang`, or start one.
    ///
    /// Check and insert happen under one lock with no await in between.
    fn load(&self, lang: &str) -> PendingLoad {
        let mut in_flight = lock(&self.inner.in_flight);
        if let Some(pending) = in_flight.get(lang) {
            return pending.clone();
        }

        tracing::info!("No cache for {}, fetching fresh data", lang);

        let service = self.clone();
        let key = lang.to_string();
        let handle = tokio::spawn(async move {
            let _release = OnDrop(Some(|| {
                lock(&service.inner.in_flight).remove(&key);
            }));
            service.fetch_and_cache(&key).await
        });

        let pending = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(SyncError::Task(e.to_string())))
        }
        .boxed()
        .shared();

        in_flight.insert(lang.to_string(), pending.clone());
        pending
    }

    async fn cached_dataset(&self, lang: &str) -> Option<LanguageDataset> {
        match self.inner.store.dataset_for_language(lang).await {
            Ok(dataset) => dataset,
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", lang, e);
                None
            }
        }
    }

    async fn fetch_and_cache(&self, lang: &str) -> Result<LanguageDataset, SyncError> {
        let dataset = self.fetch_all_pages(lang).await?;

        tracing::info!(
            "Storing {} categories for {}, lastUpdated: {:?}",
            dataset.items.len(),
            lang,
            dataset.last_updated
        );
        if let Err(e) = self.inner.store.put(&dataset.to_records()).await {
            tracing::warn!("Could not cache categories for {}: {}", lang, e);
        }

        Ok(dataset)
    }

    /// Follow `next_token` until the listing is exhausted.
    async fn fetch_all_pages(&self, lang: &str) -> Result<LanguageDataset, SyncError> {
        let mut items = Vec::new();
        let mut last_updated = None;
        let mut next_token: Option<String> = None;

        for page_number in 1..=self.inner.max_pages {
            let page = self
                .inner
                .source
                .fetch_category_page(lang, next_token.as_deref())
                .await
                .map_err(|e| SyncError::Fetch {
                    lang: lang.to_string(),
                    message: e.to_string(),
                })?;

            items.extend(page.items);
            if page.last_updated.is_some() {
                last_updated = page.last_updated;
            }
            next_token = page.next_token.filter(|token| !token.is_empty());

            if next_token.is_none() {
                tracing::debug!("Fetched {} page(s) for {}", page_number, lang);
                return Ok(LanguageDataset {
                    lang: lang.to_string(),
                    items,
                    last_updated,
                    fetched_at: now_timestamp(),
                });
            }
        }

        Err(SyncError::Fetch {
            lang: lang.to_string(),
            message: format!(
                "pagination did not finish within {} pages",
                self.inner.max_pages
            ),
        })
    }

    /// Whether the server has a newer dataset than the cache.
    ///
    /// The metadata endpoint is asked first and the first listing page second.
    /// When neither answers the cache is kept. Only a store failure is an error.
    pub async fn check_for_update(&self, lang: &str) -> Result<bool, SyncError> {
        let cached = self.inner.store.dataset_for_language(lang).await?;
        let Some(local) = cached.and_then(|dataset| dataset.last_updated) else {
            tracing::info!("No cached timestamp for {}, needs update", lang);
            return Ok(true);
        };

        match self.inner.source.fetch_metadata().await {
            Ok(Metadata {
                categories_last_updated: Some(remote),
            }) => {
                let stale = is_newer(&remote, &local);
                tracing::debug!("Metadata check for {}: stale = {}", lang, stale);
                return Ok(stale);
            }
            Ok(_) => tracing::debug!("Metadata carries no categories timestamp"),
            Err(e) => tracing::warn!("Metadata API failed for {}: {}", lang, e),
        }

        match self.inner.source.fetch_category_page(lang, None).await {
            Ok(CategoryPage {
                last_updated: Some(remote),
                ..
            }) => {
                let stale = is_newer(&remote, &local);
                tracing::debug!("Listing check for {}: stale = {}", lang, stale);
                return Ok(stale);
            }
            Ok(_) => tracing::debug!("Listing for {} carries no timestamp", lang),
            Err(e) => tracing::warn!("Categories API check failed for {}: {}", lang, e),
        }

        tracing::info!("Both update probes unavailable for {}, keeping cache", lang);
        Ok(false)
    }

    /// Infallible form of `check_for_update`: any failure reads as "not stale".
    pub async fn should_update_categories(&self, lang: &str) -> bool {
        self.check_for_update(lang).await.unwrap_or_else(|e| {
            tracing::warn!("Error checking update for {}: {}", lang, e);
            false
        })
    }

    /// Check staleness and, if stale, schedule a detached refresh.
    pub async fn trigger_background_update_if_needed(
        &self,
        lang: &str,
    ) -> Result<UpdateCheck, SyncError> {
        if !self.check_for_update(lang).await? {
            tracing::debug!("No update needed for {}", lang);
            return Ok(UpdateCheck::UpToDate);
        }

        if self.spawn_refresh(lang) {
            Ok(UpdateCheck::RefreshScheduled)
        } else {
            Ok(UpdateCheck::RefreshInProgress)
        }
    }

    fn spawn_update_check(&self, lang: &str) {
        let service = self.clone();
        let lang = lang.to_string();
        self.inner.tasks.spawn(async move {
            if let Err(e) = service.trigger_background_update_if_needed(&lang).await {
                tracing::warn!("Update check failed for {}: {}", lang, e);
            }
        });
    }

    /// Returns false when a refresh for `lang` is already running.
    fn spawn_refresh(&self, lang: &str) -> bool {
        if !lock(&self.inner.refreshing).insert(lang.to_string()) {
            tracing::debug!("Background refresh already running for {}", lang);
            return false;
        }

        tracing::info!("Triggering background update for {}", lang);

        let service = self.clone();
        let lang = lang.to_string();
        self.inner.tasks.spawn(async move {
            let _release = OnDrop(Some(|| {
                lock(&service.inner.refreshing).remove(&lang);
            }));
            match service.refresh(&lang).await {
                Ok(dataset) => tracing::info!(
                    "Background update completed for {}. New lastUpdated: {:?}",
                    lang,
                    dataset.last_updated
                ),
                Err(e) => tracing::error!("Background update failed for {}: {}", lang, e),
            }
        });
        true
    }

    /// Fetch a language and swap it into the store in one batch.
    async fn refresh(&self, lang: &str) -> Result<LanguageDataset, SyncError> {
        let dataset = self.fetch_all_pages(lang).await?;
        self.inner
            .store
            .replace_language(lang, &dataset.to_records())
            .await?;
        Ok(dataset)
    }

    /// Re-fetch a language regardless of staleness and replace its cached records.
    pub async fn force_refresh_categories(
        &self,
        lang: Option<&str>,
    ) -> Result<LanguageDataset, SyncError> {
        let lang = self.resolve_language(lang);
        tracing::info!("Force refreshing categories for {}", lang);

        self.mark_loaded(&lang);
        let dataset = self.refresh(&lang).await?;

        tracing::info!("Force refresh completed for {}", lang);
        Ok(dataset)
    }

    /// Forget every loaded language and wipe the store.
    pub async fn clear_all_languages(&self) -> Result<(), SyncError> {
        lock(&self.inner.loaded_languages).clear();
        self.inner.store.clear().await?;
        tracing::info!("All language caches cleared");
        Ok(())
    }

    pub fn get_loaded_languages(&self) -> Vec<String> {
        lock(&self.inner.loaded_languages).iter().cloned().collect()
    }

    pub async fn language_summaries(&self) -> Result<Vec<LanguageSummary>, SyncError> {
        let mut summaries = Vec::new();
        for lang in self.get_loaded_languages() {
            summaries.push(self.inner.store.summary(&lang).await?);
        }
        Ok(summaries)
    }

    /// Cached record for one category, without touching the network.
    pub async fn get_category(
        &self,
        category: &str,
        lang: Option<&str>,
    ) -> Result<Option<CategoryRecord>, SyncError> {
        let lang = self.resolve_language(lang);
        Ok(self.inner.store.get_by_id(category, &lang).await?)
    }

    /// Stop watching all languages. Cached records stay.
    pub fn reset(&self) {
        lock(&self.inner.loaded_languages).clear();
        tracing::info!("Loaded languages reset");
    }

    /// Wait until every detached check and refresh has finished.
    #[cfg(test)]
    pub async fn wait_for_background(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.inner.tasks.reopen();
    }

    pub async fn shutdown(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryCategoryStore;
    use crate::testing::{record, FakeSource};
    use futures::future::join_all;

    const OLD: &str = "2024-01-01T00:00:00.000Z";
    const NEW: &str = "2024-02-01T00:00:00.000Z";

    fn service_with(source: &Arc<FakeSource>) -> (CategorySyncService, Arc<MemoryCategoryStore>) {
        let store = Arc::new(MemoryCategoryStore::new());
        let service = CategorySyncService::new(
            store.clone(),
            source.clone(),
            UserLocale::parse("en-US"),
            10,
        );
        (service, store)
    }

    fn two_page_source() -> Arc<FakeSource> {
        let source = Arc::new(FakeSource::new());
        source.set_pages(
            "en",
            OLD,
            &[&[("c1", "Shoes"), ("c2", "Socks")], &[("c3", "Hats")]],
        );
        source
    }

    #[tokio::test]
    async fn test_cache_miss_fetches_every_page() {
        let source = two_page_source();
        let (service, store) = service_with(&source);

        let dataset = service.get_categories(Some("en")).await.unwrap();

        assert_eq!(dataset.items.len(), 3);
        assert_eq!(dataset.last_updated.as_deref(), Some(OLD));
        assert_eq!(source.page_calls(), 2);
        assert_eq!(store.query_by_language("en").await.unwrap().len(), 3);
        assert_eq!(service.get_loaded_languages(), vec!["en"]);
    }

    #[tokio::test]
    async fn test_cache_hit_returns_without_fetching() {
        let source = two_page_source();
        source.set_metadata(Some(OLD));
        let (service, _store) = service_with(&source);

        service.get_categories(Some("en")).await.unwrap();
        let cached = service.get_categories(Some("en")).await.unwrap();
        service.wait_for_background().await;

        let texts: Vec<&str> = cached.items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["Hats", "Shoes", "Socks"]);
        assert_eq!(source.page_calls(), 2);
        assert_eq!(source.metadata_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_share_one_fetch() {
        let source = two_page_source();
        source.set_latency(std::time::Duration::from_millis(50));
        let (service, _store) = service_with(&source);

        let results = join_all((0..8).map(|_| service.get_categories(Some("en")))).await;

        assert_eq!(source.page_calls(), 2);
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert_eq!(result.as_ref().unwrap(), first);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_from_separate_tasks_share_one_fetch() {
        let source = two_page_source();
        source.set_latency(std::time::Duration::from_millis(50));
        let (service, _store) = service_with(&source);

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.get_categories(Some("en")).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().items.len(), 3);
        }

        assert_eq!(source.page_calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_language_uses_default_locale() {
        let source = Arc::new(FakeSource::new());
        source.set_pages("es", OLD, &[&[("c1", "Zapatos")]]);
        let store = Arc::new(MemoryCategoryStore::new());
        let service =
            CategorySyncService::new(store, source.clone(), UserLocale::parse("es-ES"), 10);

        let dataset = service.get_categories(None).await.unwrap();

        assert_eq!(service.default_language(), "es");
        assert_eq!(dataset.lang, "es");
        assert_eq!(dataset.items[0].text, "Zapatos");
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_and_allows_retry() {
        let source = two_page_source();
        source.set_failing(true);
        let (service, store) = service_with(&source);

        let err = service.get_categories(Some("en")).await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch { ref lang, .. } if lang == "en"));
        assert!(store.is_empty().await);

        source.set_failing(false);
        let dataset = service.get_categories(Some("en")).await.unwrap();
        assert_eq!(dataset.items.len(), 3);
    }

    #[tokio::test]
    async fn test_stale_cache_is_refreshed_in_background() {
        let source = two_page_source();
        let (service, store) = service_with(&source);
        service.get_categories(Some("en")).await.unwrap();

        source.set_pages("en", NEW, &[&[("c1", "Shoes"), ("c4", "Boots")]]);
        source.set_metadata(Some(NEW));

        let served = service.get_categories(Some("en")).await.unwrap();
        assert_eq!(served.last_updated.as_deref(), Some(OLD));
        assert_eq!(served.items.len(), 3);

        service.wait_for_background().await;

        let refreshed = store.query_by_language("en").await.unwrap();
        let ids: Vec<&str> = refreshed.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(ids, vec!["c4", "c1"]);
        assert!(refreshed.iter().all(|r| r.last_updated.as_deref() == Some(NEW)));
    }

    #[tokio::test]
    async fn test_check_for_update_probes() {
        let source = two_page_source();
        let (service, _store) = service_with(&source);

        assert!(service.check_for_update("en").await.unwrap());
        service.get_categories(Some("en")).await.unwrap();

        source.set_metadata(Some(NEW));
        assert!(service.check_for_update("en").await.unwrap());

        source.set_metadata(Some(OLD));
        assert!(!service.check_for_update("en").await.unwrap());

        // Metadata down: the listing's timestamp decides.
        source.fail_metadata();
        assert!(!service.check_for_update("en").await.unwrap());
        source.set_pages("en", NEW, &[&[("c1", "Shoes")]]);
        assert!(service.check_for_update("en").await.unwrap());

        // Both down: keep the cache.
        source.set_failing(true);
        assert!(!service.check_for_update("en").await.unwrap());
        assert!(!service.should_update_categories("en").await);
    }

    #[tokio::test]
    async fn test_unparseable_remote_timestamp_keeps_cache() {
        let source = two_page_source();
        let (service, _store) = service_with(&source);
        service.get_categories(Some("en")).await.unwrap();

        source.set_metadata(Some("yesterday-ish"));
        assert!(!service.check_for_update("en").await.unwrap());
    }

    #[tokio::test]
    async fn test_offset_less_timestamps_are_compared_as_utc() {
        let source = Arc::new(FakeSource::new());
        source.set_pages("en", "2024-05-01T00:00:00", &[&[("c1", "Shoes")]]);
        let (service, _store) = service_with(&source);
        service.get_categories(Some("en")).await.unwrap();

        source.set_metadata(Some("2024-06-01T00:00:00"));
        assert!(service.check_for_update("en").await.unwrap());

        source.set_metadata(Some("2024-04-30"));
        assert!(!service.check_for_update("en").await.unwrap());

        source.set_metadata(Some("2024-05-01T00:00:01Z"));
        assert!(service.check_for_update("en").await.unwrap());
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(2, 0, 0))
            .map(|n| n.and_utc());
        assert_eq!(parse_timestamp("2024-05-01T02:00:00.000Z"), expected);
        assert_eq!(parse_timestamp("2024-05-01T04:00:00+02:00"), expected);
        assert_eq!(parse_timestamp("2024-05-01T02:00:00"), expected);
        assert_eq!(parse_timestamp("2024-05-01T02:00"), expected);
        assert!(parse_timestamp("2024-05-01").is_some());
        assert!(parse_timestamp("yesterday-ish").is_none());
    }

    #[tokio::test]
    async fn test_failed_background_refresh_keeps_last_known_good() {
        let source = two_page_source();
        let (service, store) = service_with(&source);
        service.get_categories(Some("en")).await.unwrap();

        source.set_metadata(Some(NEW));
        source.set_failing(true);

        let outcome = service.trigger_background_update_if_needed("en").await.unwrap();
        assert_eq!(outcome, UpdateCheck::RefreshScheduled);
        service.wait_for_background().await;

        assert_eq!(store.query_by_language("en").await.unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_refresh_per_language_at_a_time() {
        let source = two_page_source();
        let (service, _store) = service_with(&source);
        service.get_categories(Some("en")).await.unwrap();

        source.set_metadata(Some(NEW));
        source.set_latency(std::time::Duration::from_millis(100));

        let first = service.trigger_background_update_if_needed("en").await.unwrap();
        let second = service.trigger_background_update_if_needed("en").await.unwrap();

        assert_eq!(first, UpdateCheck::RefreshScheduled);
        assert_eq!(second, UpdateCheck::RefreshInProgress);

        service.wait_for_background().await;
        let third = service.trigger_background_update_if_needed("en").await.unwrap();
        assert_eq!(third, UpdateCheck::RefreshScheduled);
        service.wait_for_background().await;
    }

    #[tokio::test]
    async fn test_force_refresh_drops_stale_records() {
        let source = two_page_source();
        let (service, store) = service_with(&source);
        store.put(&[record("ghost", "en", "Ghost")]).await.unwrap();
        store.put(&[record("c1", "es", "Zapatos")]).await.unwrap();

        let dataset = service.force_refresh_categories(Some("en")).await.unwrap();

        assert_eq!(dataset.items.len(), 3);
        let ids: Vec<String> = store
            .query_by_language("en")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.category)
            .collect();
        assert_eq!(ids, vec!["c3", "c1", "c2"]);
        assert!(store.get_by_id("ghost", "en").await.unwrap().is_none());
        assert_eq!(store.query_by_language("es").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_failure_keeps_cache() {
        let source = two_page_source();
        let (service, store) = service_with(&source);
        service.get_categories(Some("en")).await.unwrap();

        source.set_failing(true);
        assert!(service.force_refresh_categories(Some("en")).await.is_err());
        assert_eq!(store.query_by_language("en").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_clear_all_languages() {
        let source = two_page_source();
        source.set_pages("es", OLD, &[&[("c1", "Zapatos")]]);
        let (service, store) = service_with(&source);

        service.get_categories(Some("en")).await.unwrap();
        service.get_categories(Some("es")).await.unwrap();
        assert_eq!(service.get_loaded_languages(), vec!["en", "es"]);

        service.clear_all_languages().await.unwrap();

        assert!(service.get_loaded_languages().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_pagination_is_bounded() {
        let source = two_page_source();
        let store = Arc::new(MemoryCategoryStore::new());
        let service = CategorySyncService::new(store, source.clone(), UserLocale::default(), 1);

        let err = service.get_categories(Some("en")).await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch { .. }));
        assert_eq!(source.page_calls(), 1);
    }

    #[tokio::test]
    async fn test_summaries_and_point_lookup() {
        let source = two_page_source();
        let (service, _store) = service_with(&source);
        service.get_categories(Some("EN")).await.unwrap();

        let summaries = service.language_summaries().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].lang, "en");
        assert_eq!(summaries[0].cached_records, 3);
        assert_eq!(summaries[0].last_updated.as_deref(), Some(OLD));

        let hit = service.get_category("c3", None).await.unwrap().unwrap();
        assert_eq!(hit.text, "Hats");
        assert!(service.get_category("c3", Some("fr")).await.unwrap().is_none());

        service.reset();
        assert!(service.get_loaded_languages().is_empty());
    }
}
