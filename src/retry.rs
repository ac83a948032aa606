//! Retry logic with bounded backoff
//!
//! Transient failures are retried with either exponential backoff (jittered,
//! capped — used for rate limiting) or linear backoff (used for transport
//! glitches). Retries are always bounded; exhausting them surfaces the last
//! error to the caller.

use crate::config::{BackoffStrategy, RetryConfig};
use crate::error::{CrawlError, FetchError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, connection resets, throttling) should return
/// `true`. Structural failures (not found, forbidden, rejected credentials)
/// should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for CrawlError {
    fn is_retryable(&self) -> bool {
        // Unauthorized is handled globally by the orchestrator's single
        // re-authentication cycle, never by local retry
        matches!(self, CrawlError::Transport(_))
    }
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        // RateLimited carries its own backoff policy in the fetcher; the
        // generic retry loop only handles transport-level transience
        matches!(self, FetchError::Transport { .. })
    }
}

/// Delay before the retry with the given 1-based attempt number
///
/// Exponential doubles the initial delay each attempt; linear grows it by the
/// initial delay each attempt. Both are capped at `max_delay`.
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let base = match config.strategy {
        BackoffStrategy::Exponential => {
            let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
            config.initial_delay.saturating_mul(factor)
        }
        BackoffStrategy::Linear => config.initial_delay.saturating_mul(attempt),
    };
    let capped = base.min(config.max_delay);
    if config.jitter { add_jitter(capped) } else { capped }
}

/// Execute an async operation with bounded backoff retry logic
///
/// `max_attempts` counts retries after the initial try. Returns the
/// successful result or the last error once retries are exhausted or the
/// error is classified as non-retryable.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;
                let delay = backoff_delay(config, attempt);

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "operation failed, retrying"
                );

                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt + 1,
                        "operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::debug!(error = %e, "operation failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay to avoid synchronized retries
///
/// Uniformly distributed between 0% and 100% of the delay, so the result is
/// between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
