//! minafetch CLI — query Mina chain-data sources from the terminal.
//!
//! Usage:
//! ```bash
//! # Best chain from a local node, with merkle paths for two accounts
//! minafetch best-chain --url http://localhost:3085/graphql --account B62q... --account B62q...
//!
//! # One archived block
//! minafetch block --height 25718 --state-hash 3NLQanLUpZLAbkciDnUs6bQGkgg48UqatpZxShHuLWSudG4M9iyn
//!
//! # Latest blocks according to the explorer
//! minafetch latest --limit 10
//!
//! # Latest blocks, each pulled from the archive
//! minafetch crawl --limit 5 --network mainnet
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use minafetch_core::{BackoffConfig, RetryConfig};
use minafetch_http::{HttpFetcherConfig, ReqwestFetcher};
use minafetch_sources::{
    BlockArchiveClient, ChainQueryClient, ExplorerClient, LatestBlocksCrawler, DEFAULT_LATEST_LIMIT,
    DEFAULT_NETWORK,
};

mod logging;

#[derive(Parser)]
#[command(
    name = "minafetch",
    about = "Fetch Mina chain state from a node, the block archive and the explorer",
    version
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Sleep between retry attempts, doubling each time (default: retry immediately)
    #[arg(long, global = true, value_name = "MS")]
    retry_backoff_ms: Option<u64>,

    /// Give up on a single HTTP request after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the reconciled best-chain snapshot from a node's GraphQL endpoint
    BestChain {
        /// Node GraphQL endpoint, e.g. http://localhost:3085/graphql
        #[arg(long)]
        url: String,
        /// Public key to fetch a merkle path for (repeatable)
        #[arg(long = "account", value_name = "KEY")]
        accounts: Vec<String>,
    },
    /// Fetch one block from the archive
    Block {
        #[arg(long)]
        height: u64,
        #[arg(long)]
        state_hash: String,
        #[arg(long, default_value = DEFAULT_NETWORK)]
        network: String,
    },
    /// List the most recently received blocks
    Latest {
        #[arg(long, default_value_t = DEFAULT_LATEST_LIMIT)]
        limit: u64,
    },
    /// List the latest blocks and fetch each one from the archive
    Crawl {
        #[arg(long, default_value_t = DEFAULT_LATEST_LIMIT)]
        limit: u64,
        #[arg(long, default_value = DEFAULT_NETWORK)]
        network: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log = if cli.verbose {
        logging::LogConfig::verbose()
    } else {
        logging::LogConfig::default()
    };
    logging::init_tracing(&log);

    let retry = retry_config(cli.retry_backoff_ms);
    tracing::debug!(?retry, "retry policy");
    let http = Arc::new(
        ReqwestFetcher::new(HttpFetcherConfig {
            request_timeout: cli.timeout_secs.map(Duration::from_secs),
            ..Default::default()
        })
        .context("building HTTP client")?,
    );

    let output: Value = match cli.command {
        Commands::BestChain { url, accounts } => {
            let snapshot = ChainQueryClient::new(http)
                .with_retry(retry)
                .fetch_best_chain(&url, &accounts)
                .await
                .with_context(|| format!("fetching best chain from {url}"))?;
            serde_json::to_value(snapshot)?
        }
        Commands::Block { height, state_hash, network } => BlockArchiveClient::new(http)
            .with_retry(retry)
            .fetch_block(height, &state_hash, &network)
            .await
            .with_context(|| format!("fetching {network}-{height}-{state_hash}"))?,
        Commands::Latest { limit } => {
            let blocks = ExplorerClient::new(http)
                .with_retry(retry)
                .fetch_latest_blocks(limit)
                .await
                .context("fetching latest blocks")?;
            serde_json::to_value(blocks)?
        }
        Commands::Crawl { limit, network } => {
            let crawler = LatestBlocksCrawler::new(
                ExplorerClient::new(http.clone()).with_retry(retry.clone()),
                BlockArchiveClient::new(http).with_retry(retry),
            )
            .with_network(network);
            let report = crawler.poll_once(limit).await.context("crawling latest blocks")?;
            for failure in &report.failed {
                eprintln!("Failed {}: {}", failure.summary, failure.error);
            }
            serde_json::to_value(report)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn retry_config(backoff_ms: Option<u64>) -> RetryConfig {
    RetryConfig {
        backoff: backoff_ms.map(|ms| BackoffConfig {
            initial: Duration::from_millis(ms),
            ..Default::default()
        }),
        ..Default::default()
    }
}
