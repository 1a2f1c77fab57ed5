//! Fetch-level error types.

use thiserror::Error;

/// Errors that can occur while fetching from any chain-data source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connection refused, DNS, transport timeout, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Upstream answered with a non-success status code.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not JSON, or did not have the expected shape.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// An expected field was absent from an otherwise valid response.
    #[error("Missing field `{0}` in response")]
    MissingField(String),

    /// GraphQL endpoint returned an error payload instead of `data`.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// A tracked account key cannot be used as a query alias.
    #[error("Invalid account key: {0:?}")]
    InvalidAccountKey(String),

    /// A caller-supplied value is out of range; rejected before any request.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An unexpected error.
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Returns `true` for transport-level failures (no usable response).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// Returns `true` when a response arrived but could not be used.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::Deserialization(_) | Self::MissingField(_) | Self::GraphQl(_)
        )
    }

    /// Returns `true` if repeating the same request cannot succeed.
    ///
    /// Client errors other than 408 (request timeout) and 429 (rate limited)
    /// are permanent, as are inputs rejected before any request was sent.
    pub fn is_permanent(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                (400..500).contains(status) && *status != 408 && *status != 429
            }
            Self::InvalidAccountKey(_) | Self::InvalidArgument(_) => true,
            _ => false,
        }
    }
}
