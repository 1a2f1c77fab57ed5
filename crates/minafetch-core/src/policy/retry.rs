//! Fixed-budget retry executor with optional exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Total attempts per operation, first try included.
///
/// Fixed: there is deliberately no per-call override.
pub const MAX_ATTEMPTS: u32 = 3;

/// Errors the executor can classify.
pub trait RetryableError: Display {
    /// `true` if another attempt cannot change the outcome.
    fn is_permanent(&self) -> bool {
        false
    }
}

impl RetryableError for FetchError {
    fn is_permanent(&self) -> bool {
        FetchError::is_permanent(self)
    }
}

/// Exponential delay between attempts.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the second attempt.
    pub initial: Duration,
    /// Multiplier applied to the delay on each further attempt.
    pub multiplier: f64,
    /// Maximum delay (caps exponential growth).
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(100),
            multiplier: 2.0,
            max: Duration::from_secs(10),
        }
    }
}

impl BackoffConfig {
    /// Returns the delay after the `failed`-th failed attempt (1-based).
    pub fn delay(&self, failed: u32) -> Duration {
        let base_ms = self.initial.as_millis() as f64
            * self.multiplier.powi(failed.saturating_sub(1) as i32);
        let cap_ms = self.max.as_millis() as f64;
        Duration::from_millis(base_ms.min(cap_ms) as u64)
    }
}

/// Configuration for the retry executor.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Sleep between attempts. `None` retries immediately.
    pub backoff: Option<BackoffConfig>,
    /// Keep retrying errors classified as permanent (e.g. HTTP 404).
    pub retry_permanent: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff: None,
            retry_permanent: true,
        }
    }
}

/// Runs an async operation up to [`MAX_ATTEMPTS`] times, returning the first
/// success or the error from the last attempt.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    pub config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Number of attempts each operation gets.
    pub fn attempts(&self) -> u32 {
        MAX_ATTEMPTS
    }

    /// Returns the delay before the attempt following `failed` failures,
    /// or `None` once the budget is spent.
    pub fn next_delay(&self, failed: u32) -> Option<Duration> {
        if failed >= MAX_ATTEMPTS {
            return None;
        }
        Some(
            self.config
                .backoff
                .as_ref()
                .map_or(Duration::ZERO, |b| b.delay(failed)),
        )
    }

    /// Execute `op`, retrying sequentially on failure.
    ///
    /// Earlier errors are dropped; only the last one is returned.
    pub async fn execute<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: RetryableError,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !self.config.retry_permanent && err.is_permanent() {
                tracing::warn!(attempt, error = %err, "permanent failure, not retrying");
                return Err(err);
            }

            match self.next_delay(attempt) {
                Some(delay) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying operation"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                None => {
                    tracing::error!(attempt, error = %err, "max attempts exceeded");
                    return Err(err);
                }
            }
        }
    }
}
