//! Latest block summaries from the third-party explorer's GraphQL API.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use minafetch_core::{
    Argument, FetchError, GraphQlRequest, HttpFetch, QueryDocument, RetryConfig, RetryExecutor,
    Selection,
};

use crate::archive::BlockArchiveKey;

pub const DEFAULT_EXPLORER_ENDPOINT: &str = "https://graphql.minaexplorer.com/";

pub const DEFAULT_LATEST_LIMIT: u64 = 10;

pub const OPERATION_NAME: &str = "Fetch";

/// Pointer to a block: enough to look it up in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerBlockSummary {
    pub block_height: u64,
    pub state_hash: String,
}

impl ExplorerBlockSummary {
    /// Archive key for this block on `network`.
    pub fn archive_key(&self, network: &str) -> BlockArchiveKey {
        BlockArchiveKey::new(network, self.block_height, self.state_hash.clone())
    }
}

impl std::fmt::Display for ExplorerBlockSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.block_height, self.state_hash)
    }
}

/// `blocks(limit: N, sortBy: RECEIVEDTIME_DESC) { blockHeight stateHash }`
pub fn latest_blocks_query(limit: u64) -> QueryDocument {
    let mut doc = QueryDocument::new(OPERATION_NAME);
    doc.push(
        Selection::field("blocks")
            .arg("limit", Argument::Int(limit))
            .arg("sortBy", Argument::Enum("RECEIVEDTIME_DESC".into()))
            .select(Selection::fields(&["blockHeight", "stateHash"])),
    );
    doc
}

/// Client for the explorer's GraphQL endpoint.
pub struct ExplorerClient {
    fetcher: Arc<dyn HttpFetch>,
    endpoint: String,
    retry: RetryExecutor,
}

impl ExplorerClient {
    pub fn new(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self {
            fetcher,
            endpoint: DEFAULT_EXPLORER_ENDPOINT.to_string(),
            retry: RetryExecutor::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry = RetryExecutor::new(config);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch up to `limit` most recently received blocks, newest first.
    ///
    /// Order and length are whatever the explorer returns.
    pub async fn fetch_latest_blocks(&self, limit: u64) -> Result<Vec<ExplorerBlockSummary>, FetchError> {
        if limit == 0 {
            return Err(FetchError::InvalidArgument("limit must be positive".into()));
        }
        let request = latest_blocks_query(limit).to_request();
        tracing::debug!(endpoint = %self.endpoint, limit, "fetching latest blocks");
        self.retry.execute(|| self.fetch_once(&request)).await
    }

    /// [`fetch_latest_blocks`](Self::fetch_latest_blocks) with
    /// [`DEFAULT_LATEST_LIMIT`].
    pub async fn fetch_default_latest_blocks(&self) -> Result<Vec<ExplorerBlockSummary>, FetchError> {
        self.fetch_latest_blocks(DEFAULT_LATEST_LIMIT).await
    }

    /// Same as [`fetch_latest_blocks`](Self::fetch_latest_blocks), serialised
    /// to a JSON string.
    pub async fn fetch_latest_blocks_json_string(&self, limit: u64) -> Result<String, FetchError> {
        let blocks = self.fetch_latest_blocks(limit).await?;
        Ok(serde_json::to_string(&blocks)?)
    }

    async fn fetch_once(&self, request: &GraphQlRequest) -> Result<Vec<ExplorerBlockSummary>, FetchError> {
        let mut data = self.fetcher.graphql(&self.endpoint, request).await?;
        let blocks = data
            .get_mut("blocks")
            .map(serde_json::Value::take)
            .ok_or_else(|| FetchError::MissingField("data.blocks".into()))?;
        Ok(serde_json::from_value(blocks)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedFetch;
    use serde_json::json;

    #[test]
    fn query_text() {
        assert_eq!(
            latest_blocks_query(10).render(),
            "query Fetch {\n  blocks(limit: 10, sortBy: RECEIVEDTIME_DESC) {\n    blockHeight\n    stateHash\n  }\n}\n"
        );
    }

    #[tokio::test]
    async fn preserves_server_order() {
        let fetch = Arc::new(ScriptedFetch::new([Ok(json!({
            "data": { "blocks": [
                { "blockHeight": 103, "stateHash": "3NKc" },
                { "blockHeight": 102, "stateHash": "3NKb" },
                { "blockHeight": 102, "stateHash": "3NKb2" },
                { "blockHeight": 101, "stateHash": "3NKa" }
            ] }
        }))]));
        let client = ExplorerClient::new(fetch.clone());
        let blocks = client.fetch_latest_blocks(4).await.unwrap();

        let hashes: Vec<_> = blocks.iter().map(|b| b.state_hash.as_str()).collect();
        assert_eq!(hashes, ["3NKc", "3NKb", "3NKb2", "3NKa"]);

        let calls = fetch.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].url, DEFAULT_EXPLORER_ENDPOINT);
        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body["operationName"], "Fetch");
        assert!(body["query"].as_str().unwrap().contains("limit: 4"));
    }

    #[tokio::test]
    async fn length_follows_upstream() {
        let fetch = Arc::new(ScriptedFetch::new([Ok(json!({
            "data": { "blocks": [{ "blockHeight": 9, "stateHash": "3NKz" }] }
        }))]));
        let blocks = ExplorerClient::new(fetch).fetch_latest_blocks(10).await.unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[tokio::test]
    async fn missing_blocks_field_fails_after_retries() {
        let fetch = Arc::new(ScriptedFetch::new([
            Ok(json!({ "data": {} })),
            Ok(json!({ "data": {} })),
            Ok(json!({ "data": {} })),
        ]));
        let client = ExplorerClient::new(fetch.clone()).with_endpoint("http://127.0.0.1:9/graphql");
        let err = client.fetch_latest_blocks(10).await.unwrap_err();
        assert!(matches!(err, FetchError::MissingField(ref f) if f == "data.blocks"), "got {err}");
        assert_eq!(fetch.calls().len(), 3);
        assert!(fetch.calls().iter().all(|c| c.url == "http://127.0.0.1:9/graphql"));
    }

    #[tokio::test]
    async fn default_call_requests_ten_blocks() {
        let fetch = Arc::new(ScriptedFetch::new([Ok(json!({ "data": { "blocks": [] } }))]));
        let blocks = ExplorerClient::new(fetch.clone()).fetch_default_latest_blocks().await.unwrap();
        assert!(blocks.is_empty());
        let body = fetch.calls()[0].body.clone().unwrap();
        assert!(body["query"].as_str().unwrap().contains("blocks(limit: 10, "));
    }

    #[tokio::test]
    async fn zero_limit_rejected() {
        let fetch = Arc::new(ScriptedFetch::default());
        let err = ExplorerClient::new(fetch.clone()).fetch_latest_blocks(0).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidArgument(_)), "got {err}");
        assert!(err.is_permanent());
        assert!(fetch.calls().is_empty());
    }

    #[tokio::test]
    async fn json_string_variant() {
        let fetch = Arc::new(ScriptedFetch::new([Ok(json!({
            "data": { "blocks": [{ "blockHeight": 5, "stateHash": "3NKe" }] }
        }))]));
        let text = ExplorerClient::new(fetch).fetch_latest_blocks_json_string(1).await.unwrap();
        assert_eq!(text, r#"[{"blockHeight":5,"stateHash":"3NKe"}]"#);
    }

    #[test]
    fn summary_drives_archive_key() {
        let summary = ExplorerBlockSummary { block_height: 25718, state_hash: "3NLQ".into() };
        assert_eq!(summary.to_string(), "25718-3NLQ");
        assert_eq!(summary.archive_key("mainnet").to_string(), "mainnet-25718-3NLQ");
    }
}
