//! Exponential-backoff retry for upstream generation calls.

use std::future::Future;
use std::time::Duration;

use crate::foundation::error::LectioError;

/// How often and how patiently to retry one upstream call.
#[derive(Debug)]
pub struct RetryPolicy<E> {
    /// Total attempts including the first. `0` behaves like `1`.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubled for each further attempt.
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub is_retryable: fn(&E) -> bool,
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            is_retryable: self.is_retryable,
        }
    }
}

impl RetryPolicy<LectioError> {
    /// Retries [`LectioError::Transient`] only: 5 attempts, 1 s base, 16 s cap.
    pub fn transient() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
            is_retryable: LectioError::is_transient,
        }
    }
}

impl<E> RetryPolicy<E> {
    /// Delay after failed attempt number `attempt` (1-based): `base * 2^(attempt-1)`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the attempt ceiling is hit.
///
/// The last error is returned unchanged when retries are exhausted.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy<E>, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max && (policy.is_retryable)(&e) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = max,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "retrying upstream call"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/retry.rs"]
mod tests;
