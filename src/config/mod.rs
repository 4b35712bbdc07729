//! Configuration module for the storefront categories service.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::models::UserLocale;

#[derive(Error, Debug)]
#[error("Invalid value {value:?} for {name}: {reason}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
    pub reason: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream GraphQL endpoint
    pub graphql_url: String,
    /// API key sent to the upstream endpoint
    pub graphql_api_key: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Locale used when a caller does not name a language
    pub default_locale: UserLocale,
    /// Period of the background staleness sweep
    pub sync_interval: Duration,
    /// Start the background sweep at boot
    pub background_sync: bool,
    /// Timeout for each upstream request
    pub http_timeout: Duration,
    /// Page size hint passed to the category listing
    pub page_size: Option<u32>,
    /// Upper bound on pages followed for one language
    pub max_pages: usize,
    /// Default minimum search term length
    pub search_min_length: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let graphql_url = text("STOREFRONT_GRAPHQL_URL", "http://127.0.0.1:4000/graphql");
        let graphql_api_key = lookup("STOREFRONT_GRAPHQL_API_KEY").filter(|k| !k.is_empty());
        let db_path = text("STOREFRONT_DB_PATH", "./data/categories.sqlite").into();
        let bind_addr = parse(&lookup, "STOREFRONT_BIND_ADDR", "127.0.0.1:8080")?;
        let log_level = text("STOREFRONT_LOG_LEVEL", "info");
        let log_json = parse(&lookup, "STOREFRONT_LOG_JSON", "false")?;
        let default_locale = UserLocale::parse(&text("STOREFRONT_DEFAULT_LOCALE", "en-US"));

        let interval_secs: u64 = parse(&lookup, "STOREFRONT_SYNC_INTERVAL_SECS", "21600")?;
        if interval_secs == 0 {
            return Err(ConfigError {
                name: "STOREFRONT_SYNC_INTERVAL_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let background_sync = parse(&lookup, "STOREFRONT_BACKGROUND_SYNC", "true")?;
        let timeout_secs: u64 = parse(&lookup, "STOREFRONT_HTTP_TIMEOUT_SECS", "15")?;
        let page_size = match lookup("STOREFRONT_PAGE_SIZE") {
            Some(_) => Some(parse(&lookup, "STOREFRONT_PAGE_SIZE", "")?),
            None => None,
        };
        let max_pages = parse(&lookup, "STOREFRONT_MAX_PAGES", "500")?;
        let search_min_length = parse(&lookup, "STOREFRONT_SEARCH_MIN_LENGTH", "2")?;

        Ok(Self {
            graphql_url,
            graphql_api_key,
            db_path,
            bind_addr,
            log_level,
            log_json,
            default_locale,
            sync_interval: Duration::from_secs(interval_secs),
            background_sync,
            http_timeout: Duration::from_secs(timeout_secs),
            page_size,
            max_pages,
            search_min_length,
        })
    }
}

fn parse<T, F>(lookup: &F, name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).unwrap_or_else(|| default.to_string());
    value.trim().parse().map_err(|e: T::Err| ConfigError {
        name,
        value: value.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_with(&[]).unwrap();

        assert_eq!(config.graphql_url, "http://127.0.0.1:4000/graphql");
        assert!(config.graphql_api_key.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/categories.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.default_locale.lang, "en");
        assert_eq!(config.sync_interval, Duration::from_secs(6 * 60 * 60));
        assert!(config.background_sync);
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert!(config.page_size.is_none());
        assert_eq!(config.max_pages, 500);
        assert_eq!(config.search_min_length, 2);
    }

    #[test]
    fn test_overrides() {
        let config = config_with(&[
            ("STOREFRONT_DEFAULT_LOCALE", "es-MX"),
            ("STOREFRONT_SYNC_INTERVAL_SECS", "60"),
            ("STOREFRONT_PAGE_SIZE", "50"),
            ("STOREFRONT_GRAPHQL_API_KEY", "secret"),
            ("STOREFRONT_BACKGROUND_SYNC", "false"),
        ])
        .unwrap();

        assert_eq!(config.default_locale.lang, "es");
        assert_eq!(config.default_locale.country, "mx");
        assert_eq!(config.sync_interval, Duration::from_secs(60));
        assert_eq!(config.page_size, Some(50));
        assert_eq!(config.graphql_api_key.as_deref(), Some("secret"));
        assert!(!config.background_sync);
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = config_with(&[("STOREFRONT_BIND_ADDR", "not-an-addr")]).unwrap_err();
        assert_eq!(err.name, "STOREFRONT_BIND_ADDR");

        let err = config_with(&[("STOREFRONT_SYNC_INTERVAL_SECS", "0")]).unwrap_err();
        assert_eq!(err.name, "STOREFRONT_SYNC_INTERVAL_SECS");

        let err = config_with(&[("STOREFRONT_MAX_PAGES", "many")]).unwrap_err();
        assert_eq!(err.name, "STOREFRONT_MAX_PAGES");
    }
}
