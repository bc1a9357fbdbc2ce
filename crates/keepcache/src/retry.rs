//! Retry utilities for remote operations.
//!
//! Remote calls back off exponentially: the delay before retry `k`
//! (0-indexed) is `base_delay * 2^k`, with no jitter, for at most
//! `max_retries` retries after the first attempt.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::sync::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_SECS, ProgressCallback, SyncProgress};

/// Configuration for retry operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Delay before the first retry; doubled for each following one.
    pub base_delay: Duration,
    /// Maximum number of retries after the first attempt.
    pub max_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(base_delay: Duration, max_retries: usize) -> Self {
        Self {
            base_delay,
            max_retries,
        }
    }

    /// Delay before retry `k` (0-indexed).
    #[must_use]
    pub fn delay_for(&self, retry: usize) -> Duration {
        let factor = u32::try_from(retry)
            .ok()
            .and_then(|shift| 1u32.checked_shl(shift))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Build an exponential backoff strategy from this configuration.
    ///
    /// The max delay is pinned to the last delay of the schedule so backon's
    /// own cap never shortens it.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let last = self.max_retries.saturating_sub(1);
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_factor(2.0)
            .with_max_delay(self.delay_for(last))
            .with_max_times(self.max_retries)
    }
}

/// Execute an operation with automatic retry on retryable errors.
///
/// - Tracks attempts with an atomic counter
/// - Uses the exponential backoff from `config`
/// - Reports every scheduled retry as [`SyncProgress::FetchRetry`]
/// - Logs retries at `warn`
///
/// Errors for which `is_retryable` returns `false` surface immediately.
///
/// # Example
///
/// ```ignore
/// use keepcache::retry::{RetryConfig, with_retry};
/// use keepcache::remote::{is_retryable, short_error_message};
///
/// let body = with_retry(
///     || async { client.fetch_once("/lists").await },
///     is_retryable,
///     short_error_message,
///     "/lists",
///     &RetryConfig::default(),
///     Some(&progress_callback),
/// ).await?;
/// ```
pub async fn with_retry<T, E, F, Fut, IsRetryable, ShortMsg>(
    mut operation: F,
    is_retryable: IsRetryable,
    short_message: ShortMsg,
    endpoint: &str,
    config: &RetryConfig,
    on_progress: Option<&ProgressCallback>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
    IsRetryable: Fn(&E) -> bool + Send + Sync + 'static,
    ShortMsg: Fn(&E) -> String + Send + Sync + 'static,
{
    let endpoint_str = endpoint.to_string();

    // Track attempt number for progress reporting
    let attempt = AtomicU32::new(0);

    let retry_op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    retry_op
        .retry(config.into_backoff())
        .notify(|err, dur| {
            let current_attempt = attempt.load(Ordering::SeqCst);
            let message = short_message(err);
            if let Some(cb) = on_progress {
                cb(SyncProgress::FetchRetry {
                    endpoint: endpoint_str.clone(),
                    attempt: current_attempt,
                    retry_after_ms: u64::try_from(dur.as_millis()).unwrap_or(u64::MAX),
                    error: message.clone(),
                });
            }
            tracing::warn!(
                endpoint = %endpoint_str,
                attempt = current_attempt,
                delay_ms = dur.as_millis() as u64,
                "Remote request failed, retrying: {}",
                message
            );
        })
        .when(is_retryable)
        .await
}
