//! RISS repository client: detail pages and the site's own search.

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::ClientWithMiddleware;
use scraper::Html;
use url::Url;

use super::{build_http_client, handle_response};
use crate::config::{Config, api};
use crate::error::ClientResult;
use crate::matching;
use crate::models::{ThesisDetails, ThesisDump};
use crate::scrape;
use crate::search::ThesisSource;

/// RISS web client.
#[derive(Clone)]
pub struct RissClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl RissClient {
    /// Create a new client.
    pub fn new(config: &Config) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(api::USER_AGENT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9"));

        Ok(Self {
            client: build_http_client(config, headers)?,
            base_url: config.riss_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a page and return its final URL and body.
    async fn get_html(&self, url: &str, params: &[(&str, &str)]) -> ClientResult<(Url, String)> {
        let response = self.client.get(url).query(params).send().await?;
        let response = handle_response(response).await?;
        let final_url = response.url().clone();
        let body = response.text().await?;
        Ok((final_url, body))
    }

    /// Scrape control number, abstract and keywords from a detail page.
    pub async fn fetch_details(&self, url: &str) -> ClientResult<ThesisDetails> {
        let (_, body) = self.get_html(url, &[]).await?;

        let document = Html::parse_document(&body);
        let text = scrape::document_text(&document);

        let details = ThesisDetails {
            control_no: matching::control_no(url),
            abstract_text: scrape::extract_abstract(&text, &document),
            keywords: scrape::extract_keywords(&text),
        };

        tracing::debug!(
            url,
            control_no = %details.control_no,
            abstract_chars = details.abstract_text.chars().count(),
            "Scraped detail page"
        );
        Ok(details)
    }

    /// Capture title and long-form content of a detail page.
    pub async fn fetch_dump(&self, url: &str) -> ClientResult<ThesisDump> {
        let (_, body) = self.get_html(url, &[]).await?;

        let document = Html::parse_document(&body);
        Ok(ThesisDump {
            title: scrape::extract_title(&document),
            url: url.to_string(),
            content: scrape::extract_content(&document),
        })
    }

    /// Query the site's thesis search and return detail-page anchors.
    pub async fn search_candidates(&self, title: &str) -> ClientResult<Vec<(String, String)>> {
        let url = format!("{}/search/Search.do", self.base_url);
        let params = [
            ("isDetailSearch", "N"),
            ("searchGubun", "true"),
            ("viewYn", "OP"),
            ("colName", "bib_t"),
            ("query", title),
        ];

        let (final_url, body) = self.get_html(&url, &params).await?;

        let document = Html::parse_document(&body);
        let anchors = scrape::search_result_anchors(&document, &final_url);
        tracing::debug!(title, candidates = anchors.len(), "RISS search results");
        Ok(anchors)
    }
}

#[async_trait::async_trait]
impl ThesisSource for RissClient {
    async fn fetch_details(&self, url: &str) -> ClientResult<ThesisDetails> {
        Self::fetch_details(self, url).await
    }

    async fn search_candidates(&self, title: &str) -> ClientResult<Vec<(String, String)>> {
        Self::search_candidates(self, title).await
    }
}

impl std::fmt::Debug for RissClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RissClient").field("base_url", &self.base_url).finish()
    }
}
