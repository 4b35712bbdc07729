//! User locale resolution.

use serde::Serialize;

const FALLBACK_LANG: &str = "en";
const FALLBACK_COUNTRY: &str = "us";

/// Language and country of the caller, both lower-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserLocale {
    pub lang: String,
    pub country: String,
}

impl UserLocale {
    /// Parse a locale tag such as `en-US`, `es_es` or `fr`.
    pub fn parse(tag: &str) -> Self {
        let mut parts = tag
            .trim()
            .split(['-', '_'])
            .map(str::trim)
            .filter(|part| !part.is_empty());

        let lang = parts
            .next()
            .map(str::to_lowercase)
            .unwrap_or_else(|| FALLBACK_LANG.to_string());
        let country = parts
            .next()
            .map(str::to_lowercase)
            .unwrap_or_else(|| FALLBACK_COUNTRY.to_string());

        Self { lang, country }
    }

    /// Take the first entry of an `Accept-Language` header.
    pub fn from_accept_language(header: &str) -> Option<Self> {
        let first = header.split(',').next()?.split(';').next()?.trim();
        if first.is_empty() || first == "*" {
            return None;
        }
        Some(Self::parse(first))
    }
}

impl Default for UserLocale {
    fn default() -> Self {
        Self {
            lang: FALLBACK_LANG.to_string(),
            country: FALLBACK_COUNTRY.to_string(),
        }
    }
}
