//! minafetch-core — foundation traits and types for MinaFetch.
//!
//! # Overview
//!
//! MinaFetch gathers chain state from three independent sources (a live
//! node's GraphQL endpoint, the static block archive and a third-party
//! explorer). The core crate defines what those clients share:
//!
//! - [`HttpFetch`] — the injected HTTP capability every client talks through
//! - [`GraphQlRequest`] / [`GraphQlResponse`] — wire envelope
//! - [`QueryDocument`] — structured GraphQL query builder
//! - [`FetchError`] — structured error type
//! - [`policy`] module — the fixed-budget [`RetryExecutor`]

pub mod error;
pub mod fetch;
pub mod policy;
pub mod query;
pub mod request;

pub use error::FetchError;
pub use fetch::HttpFetch;
pub use policy::{BackoffConfig, RetryConfig, RetryExecutor, RetryableError, MAX_ATTEMPTS};
pub use query::{Argument, QueryDocument, Selection};
pub use request::{GraphQlError, GraphQlRequest, GraphQlResponse};
