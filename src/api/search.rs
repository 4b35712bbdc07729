//! Search API endpoints.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::search::RankedMatch;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Search term.
    #[serde(default)]
    pub q: String,
    /// Minimum trimmed term length (default from configuration).
    pub min_length: Option<usize>,
}

/// Ranked matches for a term.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<RankedMatch>,
    pub total: usize,
}

/// GET /api/search - Search cached categories across all languages.
pub async fn search_categories(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let results = state.search.search(&params.q, params.min_length).await?;
    let total = results.len();

    success(SearchResponse { results, total })
}
