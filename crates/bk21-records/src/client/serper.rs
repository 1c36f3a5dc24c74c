//! Serper (Google search API) client.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest_middleware::ClientWithMiddleware;

use super::{build_http_client, read_json};
use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::models::{OrganicResult, SearchRequest, SearchResponse};
use crate::search::WebSearch;

/// Search API client.
#[derive(Clone)]
pub struct SerperClient {
    client: ClientWithMiddleware,
    url: String,
}

impl SerperClient {
    /// Create a new client. Fails without an API key.
    pub fn new(config: &Config) -> ClientResult<Self> {
        let key = config
            .serper_api_key
            .as_deref()
            .ok_or_else(|| ClientError::auth("SERPER_API_KEY is not set"))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "X-API-KEY",
            HeaderValue::from_str(key).map_err(|_| ClientError::auth("invalid API key"))?,
        );

        Ok(Self { client: build_http_client(config, headers)?, url: config.serper_url.clone() })
    }

    /// Run one query and return its organic results.
    pub async fn search(&self, query: &str, num: u32) -> ClientResult<Vec<OrganicResult>> {
        let body = serde_json::to_string(&SearchRequest::korean(query, num))?;

        tracing::debug!(query, num, "Search API request");
        let response = self.client.post(&self.url).body(body).send().await?;
        let parsed: SearchResponse = read_json(response).await?;

        Ok(parsed.organic)
    }
}

#[async_trait::async_trait]
impl WebSearch for SerperClient {
    async fn search(&self, query: &str, num: u32) -> ClientResult<Vec<OrganicResult>> {
        Self::search(self, query, num).await
    }
}

impl std::fmt::Debug for SerperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerperClient").field("url", &self.url).finish()
    }
}
