//! Historical blocks from the static, content-addressed block archive.
//!
//! Each block lives at `{base}/{network}-{height}-{state_hash}.json`. The
//! record is returned exactly as stored.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use minafetch_core::{FetchError, HttpFetch, RetryConfig, RetryExecutor};

pub const DEFAULT_ARCHIVE_BASE_URL: &str =
    "https://storage.googleapis.com/mina_network_block_data";

pub const DEFAULT_NETWORK: &str = "mainnet";

/// Identifies one archived block object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockArchiveKey {
    pub network: String,
    pub height: u64,
    pub state_hash: String,
}

impl BlockArchiveKey {
    pub fn new(network: impl Into<String>, height: u64, state_hash: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            height,
            state_hash: state_hash.into(),
        }
    }

    /// Key on the default (`mainnet`) network.
    pub fn mainnet(height: u64, state_hash: impl Into<String>) -> Self {
        Self::new(DEFAULT_NETWORK, height, state_hash)
    }

    /// Object URL under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{self}.json", base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Display for BlockArchiveKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.network, self.height, self.state_hash)
    }
}

/// Client for the block archive object store.
pub struct BlockArchiveClient {
    fetcher: Arc<dyn HttpFetch>,
    base_url: String,
    retry: RetryExecutor,
}

impl BlockArchiveClient {
    pub fn new(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self {
            fetcher,
            base_url: DEFAULT_ARCHIVE_BASE_URL.to_string(),
            retry: RetryExecutor::default(),
        }
    }

    /// Point at a mirror of the archive.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry = RetryExecutor::new(config);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the block at `height` with `state_hash` on `network`.
    pub async fn fetch_block(
        &self,
        height: u64,
        state_hash: &str,
        network: &str,
    ) -> Result<Value, FetchError> {
        self.fetch_by_key(&BlockArchiveKey::new(network, height, state_hash))
            .await
    }

    /// [`fetch_block`](Self::fetch_block) on the default network.
    pub async fn fetch_mainnet_block(&self, height: u64, state_hash: &str) -> Result<Value, FetchError> {
        self.fetch_block(height, state_hash, DEFAULT_NETWORK).await
    }

    /// Fetch the block identified by `key`.
    ///
    /// A key that does not exist upstream is an ordinary failure; whether it
    /// is retried depends on the configured [`RetryConfig`].
    pub async fn fetch_by_key(&self, key: &BlockArchiveKey) -> Result<Value, FetchError> {
        if key.height == 0 {
            return Err(FetchError::InvalidArgument("block height must be positive".into()));
        }
        let url = key.url(&self.base_url);
        tracing::debug!(%key, "fetching archived block");
        self.retry.execute(|| self.fetcher.get_json(&url)).await
    }

    /// Same as [`fetch_block`](Self::fetch_block), serialised to a JSON string.
    pub async fn fetch_block_json_string(
        &self,
        height: u64,
        state_hash: &str,
        network: &str,
    ) -> Result<String, FetchError> {
        let block = self.fetch_block(height, state_hash, network).await?;
        Ok(serde_json::to_string(&block)?)
    }
}
