//! Upstream category API.
//!
//! The sync service only sees the `CategorySource` trait; `GraphQlClient` is the
//! production implementation.

mod graphql;

pub use graphql::GraphQlClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CategoryPage, Metadata};

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Upstream returned HTTP {0}")]
    Status(u16),
    #[error("GraphQL error: {0}")]
    GraphQl(String),
    #[error("Response had no data for {0}")]
    MissingData(&'static str),
}

/// Remote source of category pages and dataset metadata.
#[async_trait]
pub trait CategorySource: Send + Sync {
    /// One page of categories for `lang`. Callers follow `next_token` until it is `None`.
    async fn fetch_category_page(
        &self,
        lang: &str,
        next_token: Option<&str>,
    ) -> Result<CategoryPage, RemoteError>;

    /// Dataset metadata; a soft dependency that may be unavailable.
    async fn fetch_metadata(&self) -> Result<Metadata, RemoteError>;
}
