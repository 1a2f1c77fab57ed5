//! minafetch-http — the production [`HttpFetch`](minafetch_core::HttpFetch)
//! implementation, backed by `reqwest`.

pub mod client;

pub use client::{HttpFetcherConfig, ReqwestFetcher};
