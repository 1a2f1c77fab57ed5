//! Policy engine — reliability wrappers shared by every client.
//!
//! Each client call runs through the same executor:
//! ```text
//! Client call → [RetryExecutor: up to 3 attempts] → [HttpFetch]
//! ```

pub mod retry;

pub use retry::{BackoffConfig, RetryConfig, RetryExecutor, RetryableError, MAX_ATTEMPTS};
