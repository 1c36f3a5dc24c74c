//! Search API request and response types.

use serde::{Deserialize, Serialize};

/// Body of a search API request.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    /// Query string.
    pub q: String,

    /// Number of results.
    pub num: u32,

    /// Country.
    pub gl: String,

    /// Interface language.
    pub hl: String,
}

impl SearchRequest {
    /// A Korean-locale request.
    #[must_use]
    pub fn korean(query: impl Into<String>, num: u32) -> Self {
        Self { q: query.into(), num, gl: "kr".to_string(), hl: "ko".to_string() }
    }
}

/// Search API response; only organic results are used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    /// Organic web results.
    #[serde(default)]
    pub organic: Vec<OrganicResult>,
}

/// One organic search result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganicResult {
    /// Result title.
    #[serde(default)]
    pub title: String,

    /// Result URL.
    #[serde(default)]
    pub link: String,

    /// Result snippet.
    #[serde(default)]
    pub snippet: String,
}
