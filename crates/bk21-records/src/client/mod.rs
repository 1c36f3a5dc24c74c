//! HTTP clients for the search API and the RISS repository.
//!
//! Every client shares the same plumbing:
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff for transient failures
//! - One status-to-error mapping in [`handle_response`]

pub mod riss;
pub mod serper;

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::Config;
use crate::error::{ClientError, ClientResult};

pub use riss::RissClient;
pub use serper::SerperClient;

/// Build an HTTP client with default headers, timeouts and retry middleware.
pub(crate) fn build_http_client(
    config: &Config,
    headers: HeaderMap,
) -> ClientResult<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .gzip(true)
        .build()?;

    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(Duration::from_secs(1), Duration::from_secs(30))
        .build_with_max_retries(config.max_transport_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Map API response status codes to errors.
pub(crate) async fn handle_response(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);

            Err(ClientError::rate_limited(retry_after))
        }
        401 | 403 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::Unauthorized { status: status.as_u16(), message: text })
        }
        404 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::not_found(text))
        }
        400 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::bad_request(text))
        }
        500..=599 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::server(status.as_u16(), text))
        }
        _ => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text })
        }
    }
}

/// Check the status and decode a JSON body.
pub(crate) async fn read_json<T>(response: reqwest::Response) -> ClientResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let response = handle_response(response).await?;
    let value: serde_json::Value = response.json().await?;
    serde_json::from_value(value).map_err(ClientError::from)
}
