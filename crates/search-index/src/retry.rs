//! Bounded retry for store operations.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::error::StoreResult;

/// Retry policy shared by writes and queries.
///
/// An operation gets at most `max_retries + 1` attempts. Only transient store
/// errors (see [`StoreError::is_transient`](crate::StoreError::is_transient))
/// are retried; anything else is returned after the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt.
    pub max_retries: u32,
    /// Pause between attempts; `None` retries immediately.
    pub delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Creates a policy from a retry count and a delay in milliseconds.
    ///
    /// A zero or negative delay means retrying without sleeping.
    pub fn new(max_retries: u32, delay_ms: i64) -> Self {
        let delay = u64::try_from(delay_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        Self { max_retries, delay }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: None,
        }
    }

    /// Runs `operation` until it succeeds, fails permanently, or the retry
    /// budget is spent. The last error is returned on exhaustion.
    pub async fn run<T, F, Fut>(&self, name: &str, mut operation: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            match operation().await {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(operation = name, attempts, "Store operation succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    if attempts > self.max_retries {
                        error!(
                            operation = name,
                            attempts,
                            error = %e,
                            "Store operation failed, giving up"
                        );
                        return Err(e);
                    }

                    warn!(
                        operation = name,
                        attempt = attempts,
                        max_retries = self.max_retries,
                        retry_in_ms = self.delay.map(|d| d.as_millis()).unwrap_or(0),
                        error = %e,
                        "Store operation failed, retrying"
                    );

                    if let Some(delay) = self.delay {
                        sleep(delay).await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> StoreError {
        StoreError::from_response(503, "unavailable")
    }

    #[test]
    fn test_new_normalizes_delay() {
        assert_eq!(RetryPolicy::new(2, 0).delay, None);
        assert_eq!(RetryPolicy::new(2, -50).delay, None);
        assert_eq!(
            RetryPolicy::new(2, 250).delay,
            Some(Duration::from_millis(250))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_makes_n_plus_one_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, 100);

        let start = tokio::time::Instant::now();
        let result: StoreResult<()> = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(unavailable()) }
            })
            .await;

        assert!(matches!(result, Err(StoreError::Status { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, 10);

        let result = policy
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err(unavailable()) } else { Ok(n) } }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_fails_fast() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, 0);

        let result: StoreResult<()> = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(StoreError::from_response(400, "bad request")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
