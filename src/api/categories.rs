//! Category API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::{header::ACCEPT_LANGUAGE, HeaderMap},
};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{CategoryRecord, LanguageDataset, LanguageSummary, UserLocale};
use crate::AppState;

/// Longest language tag accepted in a path or query.
const MAX_LANGUAGE_LEN: usize = 35;

/// Optional language selector.
#[derive(Debug, Deserialize)]
pub struct LanguageQuery {
    pub lang: Option<String>,
}

/// Loaded languages and their cache status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguagesResponse {
    pub default_language: String,
    pub languages: Vec<LanguageSummary>,
}

pub(crate) fn validate_language(lang: &str) -> Result<&str, AppError> {
    let lang = lang.trim();
    let valid = !lang.is_empty()
        && lang.len() <= MAX_LANGUAGE_LEN
        && lang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(AppError::BadRequest(format!(
            "Invalid language code: {:?}",
            lang
        )));
    }
    Ok(lang)
}

/// Explicit `lang` parameter first, then the first `Accept-Language` entry.
fn requested_language(
    query: Option<String>,
    headers: &HeaderMap,
) -> Result<Option<String>, AppError> {
    if let Some(lang) = query.filter(|l| !l.trim().is_empty()) {
        return Ok(Some(validate_language(&lang)?.to_string()));
    }

    Ok(headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .and_then(UserLocale::from_accept_language)
        .map(|locale| locale.lang))
}

/// GET /api/categories - Categories for the requested or caller's language.
pub async fn get_categories(
    State(state): State<AppState>,
    Query(query): Query<LanguageQuery>,
    headers: HeaderMap,
) -> ApiResult<LanguageDataset> {
    let lang = requested_language(query.lang, &headers)?;
    let dataset = state.sync.get_categories(lang.as_deref()).await?;
    success(dataset)
}

/// GET /api/categories/{lang} - Categories for one language.
pub async fn get_language_categories(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> ApiResult<LanguageDataset> {
    let lang = validate_language(&lang)?;
    let dataset = state.sync.get_categories(Some(lang)).await?;
    success(dataset)
}

/// POST /api/categories/{lang}/refresh - Re-fetch a language, bypassing staleness checks.
pub async fn refresh_categories(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> ApiResult<LanguageDataset> {
    let lang = validate_language(&lang)?;
    let dataset = state.sync.force_refresh_categories(Some(lang)).await?;
    success(dataset)
}

/// GET /api/categories/{lang}/{category} - One cached category.
pub async fn get_category(
    State(state): State<AppState>,
    Path((lang, category)): Path<(String, String)>,
) -> ApiResult<CategoryRecord> {
    let lang = validate_language(&lang)?;

    match state.sync.get_category(&category, Some(lang)).await? {
        Some(record) => success(record),
        None => Err(AppError::NotFound(format!(
            "Category {} not found for language {}",
            category, lang
        ))),
    }
}

/// DELETE /api/categories - Drop every cached language.
pub async fn clear_categories(State(state): State<AppState>) -> ApiResult<()> {
    state.sync.clear_all_languages().await?;
    success(())
}

/// GET /api/languages - Languages loaded since the last reset.
pub async fn list_languages(State(state): State<AppState>) -> ApiResult<LanguagesResponse> {
    let languages = state.sync.language_summaries().await?;
    success(LanguagesResponse {
        default_language: state.sync.default_language().to_string(),
        languages,
    })
}
