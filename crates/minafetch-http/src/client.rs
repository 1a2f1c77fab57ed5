//! HTTP fetcher backed by `reqwest`.
//!
//! One `reqwest::Client` (and its connection pool) per fetcher; every request
//! releases its connection when the response body has been read or the
//! future is dropped.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use minafetch_core::error::FetchError;
use minafetch_core::fetch::HttpFetch;

/// Configuration for `ReqwestFetcher`.
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Whole-request timeout. `None` waits indefinitely; callers that need
    /// bounded latency wrap their calls instead.
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            user_agent: concat!("minafetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// `HttpFetch` over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    http: reqwest::Client,
}

impl ReqwestFetcher {
    /// Build a fetcher from the given configuration.
    pub fn new(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| FetchError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Build with default configuration.
    pub fn default_client() -> Result<Self, FetchError> {
        Self::new(HttpFetcherConfig::default())
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn read_json(resp: reqwest::Response) -> Result<Value, FetchError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        tracing::debug!(%url, "GET");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Self::read_json(resp).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, FetchError> {
        tracing::debug!(%url, "POST");
        // `.json()` sets `Content-Type: application/json`.
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;
        Self::read_json(resp).await
    }
}
