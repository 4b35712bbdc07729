//! GraphQL client for the product/category API.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{CategorySource, RemoteError};
use crate::config::Config;
use crate::models::{CategoryPage, Metadata};

/// Header carrying the upstream API key.
pub const API_KEY_HEADER: &str = "x-api-key";

const CATEGORIES_QUERY: &str = r#"
query GetAllCategoriesByLanguage($lang: String!, $limit: Int, $nextToken: String) {
  getAllCategoriesByLanguage(lang: $lang, limit: $limit, nextToken: $nextToken) {
    items {
      category
      text
    }
    nextToken
    lastUpdated
  }
}
"#;

const METADATA_QUERY: &str = r#"
query GetMetadata {
  getMetadata {
    categoriesLastUpdated
  }
}
"#;

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoriesData {
    get_all_categories_by_language: Option<CategoryPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataData {
    get_metadata: Option<Metadata>,
}

fn into_data<T>(response: GraphQlResponse<T>, what: &'static str) -> Result<T, RemoteError> {
    if !response.errors.is_empty() {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(RemoteError::GraphQl(messages.join("; ")));
    }
    response.data.ok_or(RemoteError::MissingData(what))
}

/// HTTP client for the upstream GraphQL endpoint.
#[derive(Clone)]
pub struct GraphQlClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    page_size: Option<u32>,
}

impl GraphQlClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
            page_size: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, RemoteError> {
        let client = Self::new(
            config.graphql_url.clone(),
            config.graphql_api_key.clone(),
            config.http_timeout,
        )?;
        Ok(client.with_page_size(config.page_size))
    }

    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<GraphQlResponse<T>, RemoteError> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .json(&GraphQlRequest { query, variables });
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CategorySource for GraphQlClient {
    async fn fetch_category_page(
        &self,
        lang: &str,
        next_token: Option<&str>,
    ) -> Result<CategoryPage, RemoteError> {
        let variables = json!({
            "lang": lang,
            "limit": self.page_size,
            "nextToken": next_token,
        });

        let response: GraphQlResponse<CategoriesData> =
            self.execute(CATEGORIES_QUERY, variables).await?;
        into_data(response, "getAllCategoriesByLanguage")?
            .get_all_categories_by_language
            .ok_or(RemoteError::MissingData("getAllCategoriesByLanguage"))
    }

    async fn fetch_metadata(&self) -> Result<Metadata, RemoteError> {
        let response: GraphQlResponse<MetadataData> =
            self.execute(METADATA_QUERY, json!({})).await?;
        into_data(response, "getMetadata")?
            .get_metadata
            .ok_or(RemoteError::MissingData("getMetadata"))
    }
}
