//! Poll the explorer for the newest blocks and pull each one from the archive.

use serde::Serialize;
use serde_json::Value;

use minafetch_core::FetchError;

use crate::archive::{BlockArchiveClient, DEFAULT_NETWORK};
use crate::explorer::{ExplorerBlockSummary, ExplorerClient};

/// An archived block together with the summary that located it.
#[derive(Debug, Clone, Serialize)]
pub struct CrawledBlock {
    pub summary: ExplorerBlockSummary,
    pub block: Value,
}

impl CrawledBlock {
    /// The record without the archive's `scheduled_time` bookkeeping field,
    /// which is not part of the block itself.
    pub fn without_scheduled_time(&self) -> Value {
        let mut block = self.block.clone();
        if let Some(obj) = block.as_object_mut() {
            obj.remove("scheduled_time");
        }
        block
    }
}

/// A block the explorer listed but the archive could not serve.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlFailure {
    pub summary: ExplorerBlockSummary,
    pub error: String,
}

/// Outcome of one poll.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlReport {
    pub blocks: Vec<CrawledBlock>,
    pub failed: Vec<CrawlFailure>,
}

impl CrawlReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct LatestBlocksCrawler {
    explorer: ExplorerClient,
    archive: BlockArchiveClient,
    network: String,
}

impl LatestBlocksCrawler {
    pub fn new(explorer: ExplorerClient, archive: BlockArchiveClient) -> Self {
        Self {
            explorer,
            archive,
            network: DEFAULT_NETWORK.to_string(),
        }
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// List the latest `limit` blocks and fetch each from the archive, one
    /// at a time, in explorer order.
    ///
    /// Fails only if the explorer listing fails; per-block archive failures
    /// are collected in [`CrawlReport::failed`].
    pub async fn poll_once(&self, limit: u64) -> Result<CrawlReport, FetchError> {
        let summaries = self.explorer.fetch_latest_blocks(limit).await?;
        tracing::info!(count = summaries.len(), network = %self.network, "polled latest blocks");

        let mut report = CrawlReport::default();
        for summary in summaries {
            let key = summary.archive_key(&self.network);
            match self.archive.fetch_by_key(&key).await {
                Ok(block) => report.blocks.push(CrawledBlock { summary, block }),
                Err(e) => {
                    tracing::warn!(%key, error = %e, "failed to retrieve archived block");
                    report.failed.push(CrawlFailure {
                        summary,
                        error: e.to_string(),
                    });
                }
            }
        }
        tracing::info!(
            fetched = report.blocks.len(),
            failed = report.failed.len(),
            "crawl finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedFetch;
    use serde_json::json;
    use std::sync::Arc;

    fn latest(blocks: serde_json::Value) -> Result<Value, FetchError> {
        Ok(json!({ "data": { "blocks": blocks } }))
    }

    #[tokio::test]
    async fn fetches_each_listed_block() {
        let explorer = Arc::new(ScriptedFetch::new([latest(json!([
            { "blockHeight": 2, "stateHash": "3NKb" },
            { "blockHeight": 1, "stateHash": "3NKa" }
        ]))]));
        let archive = Arc::new(ScriptedFetch::new([
            Ok(json!({ "height": 2 })),
            Ok(json!({ "height": 1 })),
        ]));
        let crawler = LatestBlocksCrawler::new(
            ExplorerClient::new(explorer),
            BlockArchiveClient::new(archive.clone()),
        )
        .with_network("devnet");

        let report = crawler.poll_once(2).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.blocks.len(), 2);
        assert_eq!(report.blocks[0].block, json!({ "height": 2 }));

        let urls: Vec<_> = archive.calls().into_iter().map(|c| c.url).collect();
        assert!(urls[0].ends_with("/devnet-2-3NKb.json"));
        assert!(urls[1].ends_with("/devnet-1-3NKa.json"));
    }

    #[tokio::test]
    async fn archive_failures_are_skipped() {
        let explorer = Arc::new(ScriptedFetch::new([latest(json!([
            { "blockHeight": 2, "stateHash": "3NKb" },
            { "blockHeight": 1, "stateHash": "3NKa" }
        ]))]));
        let gone = || Err(FetchError::Status { status: 404, body: String::new() });
        let archive = Arc::new(ScriptedFetch::new([gone(), gone(), gone(), Ok(json!({ "height": 1 }))]));
        let crawler = LatestBlocksCrawler::new(
            ExplorerClient::new(explorer),
            BlockArchiveClient::new(archive.clone()),
        );

        let report = crawler.poll_once(2).await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].summary.state_hash, "3NKb");
        assert_eq!(report.blocks.len(), 1);
        assert_eq!(report.blocks[0].summary.block_height, 1);
        assert_eq!(archive.calls().len(), 4);
    }

    #[tokio::test]
    async fn explorer_failure_fails_poll() {
        let down = || Err(FetchError::Http("dns".into()));
        let explorer = Arc::new(ScriptedFetch::new([down(), down(), down()]));
        let archive = Arc::new(ScriptedFetch::default());
        let crawler = LatestBlocksCrawler::new(
            ExplorerClient::new(explorer),
            BlockArchiveClient::new(archive.clone()),
        );
        assert!(crawler.poll_once(10).await.is_err());
        assert!(archive.calls().is_empty());
    }

    #[test]
    fn strips_scheduled_time() {
        let crawled = CrawledBlock {
            summary: ExplorerBlockSummary { block_height: 1, state_hash: "3NKa".into() },
            block: json!({ "scheduled_time": "1616195760000", "protocol_state": {} }),
        };
        assert_eq!(crawled.without_scheduled_time(), json!({ "protocol_state": {} }));
        assert!(crawled.block.get("scheduled_time").is_some());
    }
}
