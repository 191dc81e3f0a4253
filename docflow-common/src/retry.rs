use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::ApiError;

/// Exponential backoff with full jitter, base 100ms, cap 5s, max 4
/// attempts. Shared by the object-store adapter, the indexer's HTTP
/// client, and the event broker publisher.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            cap: Duration::from_secs(5),
            max_attempts: 4,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.base.as_millis().saturating_mul(1u128 << attempt.min(20));
        let capped = exp.min(self.cap.as_millis());
        let jittered = rand::rng().random_range(0..=capped.max(1));
        Duration::from_millis(jittered as u64)
    }

    /// Retries `operation` until it succeeds, exhausts `max_attempts`, or
    /// returns a non-retryable error. Only `ApiError::Dependency` (or any
    /// error whose mapped `ApiError` is retryable) triggers another
    /// attempt.
    pub async fn retry<T, F, Fut>(&self, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt + 1 < self.max_attempts => {
                    let delay = self.backoff_for_attempt(attempt);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    use super::*;

    #[tokio::test]
    async fn retries_dependency_errors_until_success() {
        let policy = RetryPolicy {
            base: Duration::from_millis(1),
            cap: Duration::from_millis(5),
            max_attempts: 4,
        };
        let attempts = AtomicU32::new(0);
        let result = policy
            .retry(|| async {
                let count = attempts.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(ApiError::dependency("transient"))
                } else {
                    Ok(42)
                }
            })
            .await
            .expect("should eventually succeed");
        assert_eq!(result, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_non_dependency_errors() {
        let policy = RetryPolicy::default();
        let attempts = AtomicU32::new(0);
        let err = policy
            .retry(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ApiError::validation("bad input"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            base: Duration::from_millis(1),
            cap: Duration::from_millis(2),
            max_attempts: 3,
        };
        let attempts = AtomicU32::new(0);
        let err = policy
            .retry(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ApiError::dependency("still down"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Dependency { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
