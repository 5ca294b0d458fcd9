//! Bounded retry with exponential backoff for inference calls.
//!
//! Network calls to the inference and embedding capabilities are the only
//! suspension points in an ingestion run, and each carries a bounded
//! timeout; this module bounds the retry count so a run can never block
//! indefinitely. Callers that exhaust the budget fall back per pipeline
//! policy (Unknown category, all-null record) instead of aborting.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use paperflow_core::{defaults, Error, Result};

/// Retry schedule: `max_attempts` tries, exponential delay from
/// `base_delay` capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::LLM_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(defaults::RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(defaults::RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// A policy with no sleeps, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before the retry following `attempt` (1-based).
    fn delay_after(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1u32 << (attempt - 1).min(16));
        exp.min(self.max_delay)
    }

    /// Run `f` up to `max_attempts` times, sleeping between attempts.
    ///
    /// Only transient failures (inference, embedding, network) are retried;
    /// anything else propagates immediately.
    pub async fn run<T, F, Fut>(&self, op: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if is_retryable(&err) && attempt < self.max_attempts => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        op,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient inference failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Whether an error represents a transient capability failure worth
/// retrying (timeout, rate limit, network).
pub fn is_retryable(err: &Error) -> bool {
    matches!(
        err,
        Error::Inference(_) | Error::Embedding(_) | Error::Request(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_schedule_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_after(4), Duration::from_millis(8000));
        assert_eq!(policy.delay_after(10), Duration::from_millis(8000));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::immediate(3);
        let calls = AtomicU32::new(0);
        let result = policy
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(Error::Inference("timeout".to_string()))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let policy = RetryPolicy::immediate(3);
        let calls = AtomicU32::new(0);
        let result: Result<()> = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::Inference("down".to_string())) }
            })
            .await;
        assert!(matches!(result, Err(Error::Inference(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_propagates_immediately() {
        let policy = RetryPolicy::immediate(3);
        let calls = AtomicU32::new(0);
        let result: Result<()> = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::InvalidInput("bad".to_string())) }
            })
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
