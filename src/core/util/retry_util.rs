use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::StoreError;

/// Bounded exponential backoff with a deadline on each attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or attempts run out.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    step: &str,
    mut op: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = match tokio::time::timeout(policy.attempt_timeout, op()).await {
            Ok(r) => r,
            Err(_) => Err(StoreError::Transport(format!(
                "{} timed out after {:?}",
                step, policy.attempt_timeout
            ))),
        };

        match result {
            Ok(v) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", step, attempt);
                }
                return Ok(v);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    step, attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
