//! Google Workspace REST clients (Sheets, Drive) and OAuth tokens.
//!
//! Every client wraps a [`GoogleClient`], which attaches a bearer token from
//! the shared [`TokenProvider`] to each request.

pub mod auth;
pub mod drive;
pub mod sheets;

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::client::{build_http_client, handle_response, read_json};
use crate::config::Config;
use crate::error::ClientResult;

pub use auth::{AuthorizedUser, Credentials, ServiceAccountKey, TokenProvider};
pub use drive::{DriveClient, DriveFile};
pub use sheets::{RecordStore, SheetsClient, Spreadsheet, spreadsheet_id_from_url};

/// Authenticated JSON client shared by the Google APIs.
#[derive(Clone)]
pub struct GoogleClient {
    http: ClientWithMiddleware,
    tokens: Arc<TokenProvider>,
}

impl GoogleClient {
    /// Create a client using the given token provider.
    pub fn new(config: &Config, tokens: Arc<TokenProvider>) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self { http: build_http_client(config, headers)?, tokens })
    }

    /// Create a client with credentials discovered from the configured paths.
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let credentials = Credentials::discover(config)?;
        let tokens = TokenProvider::new(config, credentials)?;
        Self::new(config, Arc::new(tokens))
    }

    async fn request(&self, method: Method, url: &str) -> ClientResult<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// GET and decode JSON.
    pub async fn get_json<T>(&self, url: &str, query: &[(&str, &str)]) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.request(Method::GET, url).await?.query(query).send().await?;
        read_json(response).await
    }

    /// Send a JSON body and decode the JSON reply.
    pub async fn send_json<B, T>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_string(body)?;
        let response = self.request(method, url).await?.query(query).body(body).send().await?;
        read_json(response).await
    }

    /// DELETE, ignoring the (empty) body.
    pub async fn delete(&self, url: &str, query: &[(&str, &str)]) -> ClientResult<()> {
        let response = self.request(Method::DELETE, url).await?.query(query).send().await?;
        handle_response(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for GoogleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleClient").field("tokens", &self.tokens).finish()
    }
}
