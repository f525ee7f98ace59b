//! Retry logic with exponential backoff
//!
//! Provides retry policies for handling transient failures when talking to
//! the project configuration API.

use crate::error::{ComputectlError, IsRetryable, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Retry policy trait
pub trait RetryPolicy: Send + Sync {
    /// Execute a function with retry logic
    async fn execute_with_retry<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: std::future::Future<Output = Result<T>> + Send;
}

/// Exponential backoff retry policy
pub struct ExponentialBackoffPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
}

impl ExponentialBackoffPolicy {
    /// Create a new exponential backoff policy
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.1,
        }
    }

    /// Calculate backoff delay for given attempt number
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponential = self.initial_delay.as_millis() as f64 * 2f64.powi(attempt as i32);
        let delay_ms = exponential.min(self.max_delay.as_millis() as f64);

        // Add jitter to prevent thundering herd
        let jitter = delay_ms * self.jitter_factor * fastrand::f64();
        Duration::from_millis((delay_ms + jitter) as u64)
    }
}

impl Default for ExponentialBackoffPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RetryPolicy for ExponentialBackoffPolicy {
    async fn execute_with_retry<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: std::future::Future<Output = Result<T>> + Send,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!("Operation succeeded after {} retries", attempt);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if !e.is_retryable() {
                        warn!("Non-retryable error, aborting: {}", e);
                        return Err(e);
                    }

                    if attempt == self.max_attempts - 1 {
                        warn!("Max retries ({}) reached", self.max_attempts);
                        return Err(ComputectlError::Retryable {
                            attempt: attempt + 1,
                            max_attempts: self.max_attempts,
                            reason: format!("{}", e),
                            source: Some(Box::new(e)),
                        });
                    }

                    last_error = Some(e);
                    let err = last_error.as_ref().unwrap();

                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        "Retryable error (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        self.max_attempts,
                        backoff,
                        err
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        // Should never reach here, but handle it anyway
        Err(last_error.unwrap_or_else(|| ComputectlError::Retryable {
            attempt: self.max_attempts,
            max_attempts: self.max_attempts,
            reason: "Unknown error".to_string(),
            source: None,
        }))
    }
}

/// No retry policy (for operations that shouldn't be retried)
pub struct NoRetryPolicy;

impl RetryPolicy for NoRetryPolicy {
    async fn execute_with_retry<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: std::future::Future<Output = Result<T>> + Send,
    {
        f().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let policy = ExponentialBackoffPolicy::new(3);
        let calls = AtomicU32::new(0);

        let result: Result<u32> = policy
            .execute_with_retry(|| {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(ComputectlError::Network("connection reset".to_string()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_validation_errors() {
        let policy = ExponentialBackoffPolicy::new(5);
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .execute_with_retry(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ComputectlError::Validation {
                        field: "vcpu".to_string(),
                        reason: "out of range".to_string(),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_reported() {
        let policy = ExponentialBackoffPolicy::new(2);

        let result: Result<()> = policy
            .execute_with_retry(|| async {
                Err(ComputectlError::Network("down".to_string()))
            })
            .await;

        match result.unwrap_err() {
            ComputectlError::Retryable {
                attempt,
                max_attempts,
                ..
            } => {
                assert_eq!(attempt, 2);
                assert_eq!(max_attempts, 2);
            }
            other => panic!("expected Retryable, got {other}"),
        }
    }
}
