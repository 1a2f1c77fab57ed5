//! minafetch-sources — clients for the three Mina chain-data sources.
//!
//! Each client takes an [`HttpFetch`](minafetch_core::HttpFetch) capability at
//! construction, wraps every network call in the fixed 3-attempt
//! [`RetryExecutor`](minafetch_core::RetryExecutor) and shares no state with
//! the others.
//!
//! # Quick start
//! ```rust,no_run
//! use minafetch_http::ReqwestFetcher;
//! use minafetch_sources::{BlockArchiveClient, ExplorerClient};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), minafetch_core::FetchError> {
//! let http = Arc::new(ReqwestFetcher::default_client()?);
//! let latest = ExplorerClient::new(http.clone()).fetch_latest_blocks(10).await?;
//! let archive = BlockArchiveClient::new(http);
//! for summary in &latest {
//!     let block = archive.fetch_mainnet_block(summary.block_height, &summary.state_hash).await?;
//!     println!("{summary}: {}", block["protocol_state"]["body"]["genesis_state_hash"]);
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod chain_query;
pub mod crawl;
pub mod explorer;

#[cfg(test)]
pub(crate) mod mock;

pub use archive::{BlockArchiveClient, BlockArchiveKey, DEFAULT_ARCHIVE_BASE_URL, DEFAULT_NETWORK};
pub use chain_query::{BestChainSnapshot, ChainQueryClient, TrackedAccountKey};
pub use crawl::{CrawlReport, CrawledBlock, LatestBlocksCrawler};
pub use explorer::{ExplorerBlockSummary, ExplorerClient, DEFAULT_EXPLORER_ENDPOINT, DEFAULT_LATEST_LIMIT};
