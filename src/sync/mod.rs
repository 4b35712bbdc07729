//! Category synchronisation: cache-or-fetch per language and periodic revalidation.

mod background;
mod service;

pub use background::{BackgroundSyncManager, SweepReport};
pub use service::{CategorySyncService, UpdateCheck};

use thiserror::Error;

use crate::db::StoreError;

/// Errors of the sync service. `Clone` because one coalesced load answers many callers.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    #[error("Failed to fetch categories for {lang}: {message}")]
    Fetch { lang: String, message: String },
    #[error("Category store error: {0}")]
    Storage(String),
    #[error("Category load task failed: {0}")]
    Task(String),
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::Storage(err.to_string())
    }
}
