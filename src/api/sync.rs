//! Background sync control endpoints.

use axum::extract::{Path, State};
use serde::Serialize;

use super::categories::validate_language;
use super::{success, ApiResult};
use crate::sync::SweepReport;
use crate::AppState;

/// Background sync status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub running: bool,
    pub interval_secs: u64,
    pub upstream: String,
    pub loaded_languages: Vec<String>,
}

/// Result of a start or stop request. `changed` is false when it was a no-op.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncToggle {
    pub changed: bool,
    pub running: bool,
}

/// Staleness verdict for one language.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub lang: String,
    pub needs_update: bool,
}

/// GET /api/sync - Background sync status.
pub async fn get_sync_status(State(state): State<AppState>) -> ApiResult<SyncStatus> {
    success(SyncStatus {
        running: state.background.is_running(),
        interval_secs: state.background.period().as_secs(),
        upstream: state.config.graphql_url.clone(),
        loaded_languages: state.sync.get_loaded_languages(),
    })
}

/// POST /api/sync/start - Start the periodic sweep.
pub async fn start_sync(State(state): State<AppState>) -> ApiResult<SyncToggle> {
    let changed = state.background.start();
    success(SyncToggle {
        changed,
        running: state.background.is_running(),
    })
}

/// POST /api/sync/stop - Stop the periodic sweep.
pub async fn stop_sync(State(state): State<AppState>) -> ApiResult<SyncToggle> {
    let changed = state.background.stop().await;
    success(SyncToggle {
        changed,
        running: state.background.is_running(),
    })
}

/// POST /api/sync/sweep - Check every loaded language now.
pub async fn run_sweep(State(state): State<AppState>) -> ApiResult<SweepReport> {
    success(state.background.sweep().await)
}

/// POST /api/sync/reset - Stop watching every loaded language. Cached records stay.
pub async fn reset_languages(State(state): State<AppState>) -> ApiResult<SyncStatus> {
    state.sync.reset();
    get_sync_status(State(state)).await
}

/// GET /api/sync/check/{lang} - Whether the upstream has a newer dataset than the cache.
pub async fn check_language(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> ApiResult<UpdateStatus> {
    let lang = validate_language(&lang)?.to_lowercase();
    let needs_update = state.sync.should_update_categories(&lang).await;
    success(UpdateStatus { lang, needs_update })
}
