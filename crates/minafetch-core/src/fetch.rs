//! The `HttpFetch` trait — the HTTP capability injected into every client.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;
use crate::request::{GraphQlRequest, GraphQlResponse};

/// Minimal HTTP capability the chain-data clients depend on.
///
/// Clients never reach for a global HTTP stack; they are handed one of these
/// at construction time.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn HttpFetch>`.
#[async_trait]
pub trait HttpFetch: Send + Sync + 'static {
    /// `GET url` and parse the response body as JSON.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;

    /// `POST url` with a JSON body (`Content-Type: application/json`) and
    /// parse the response body as JSON.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, FetchError>;

    /// Convenience: post a GraphQL envelope and return its `data` member.
    async fn graphql(&self, url: &str, req: &GraphQlRequest) -> Result<Value, FetchError> {
        let body = serde_json::to_value(req)?;
        let raw = self.post_json(url, &body).await?;
        let resp: GraphQlResponse = serde_json::from_value(raw)?;
        resp.into_data()
    }
}
