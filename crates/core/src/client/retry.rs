//! Fixed-delay retry policy.

use crate::gateway::UpstreamError;
use std::{future::Future, time::Duration};
use tracing::warn;

/// Classifies a failure as worth retrying or not.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for UpstreamError {
    fn is_retryable(&self) -> bool {
        UpstreamError::is_retryable(self)
    }
}

/// How a retried operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    /// An attempt succeeded.
    Succeeded { value: T, attempts: u32 },
    /// Every attempt failed with a retryable error.
    Exhausted { last_error: E, attempts: u32 },
    /// An attempt failed with an error that is not retried.
    Failed { error: E, attempts: u32 },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts, .. }
            | RetryOutcome::Exhausted { attempts, .. }
            | RetryOutcome::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Up to `max_attempts` tries, sleeping `delay` after each retryable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(3000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is used. The closure receives the 1-indexed
    /// attempt number. No delay follows the final attempt.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    return RetryOutcome::Succeeded {
                        value,
                        attempts: attempt,
                    };
                }
                Err(error) if !error.is_retryable() => {
                    return RetryOutcome::Failed {
                        error,
                        attempts: attempt,
                    };
                }
                Err(error) if attempt >= max_attempts => {
                    return RetryOutcome::Exhausted {
                        last_error: error,
                        attempts: attempt,
                    };
                }
                Err(error) => {
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = self.delay.as_millis() as u64,
                        %error,
                        "Attempt failed with a retryable error, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
