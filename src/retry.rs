//! Reusable retry policy for network-bound calls: bounded attempts, a
//! backoff function, and a retryable-error predicate, replacing per-call
//! ad hoc loops.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::error::CheckResult;

#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    Fixed(Duration),
    Linear(Duration),
    Exponential(Duration),
}

impl Backoff {
    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed(base) => *base,
            Backoff::Linear(base) => *base * attempt,
            Backoff::Exponential(base) => *base * 2u32.saturating_pow(attempt.saturating_sub(1)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Exponential(Duration::from_millis(500)),
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Drive `f` until it succeeds, a non-retryable error surfaces, or the
    /// attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, op: &str, mut f: F) -> CheckResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CheckResult<T>>,
    {
        let mut attempt = 1u32;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff.delay(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        op,
                        attempt,
                        self.max_attempts,
                        err,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
