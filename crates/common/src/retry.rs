//! Bounded retry with exponential backoff.
//!
//! Name lookups and artwork downloads share this policy instead of
//! hand-rolling their own attempt loops.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Retry policy: a fixed number of attempts with a doubling delay.
///
/// The delay after attempt `n` (0-based) is `base_delay * 2^n`. No delay
/// follows the final attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given attempt count and base delay.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Runs `op` until it succeeds or the attempts are exhausted.
    ///
    /// Every error is treated as transient. Operations that can fail
    /// definitively (e.g. "no data for this id") should return `Ok` with
    /// an empty value instead of an error.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut delay = self.base_delay;

        for attempt in 1..=attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt == attempts => {
                    warn!(what, attempt, error = %e, "giving up after final attempt");
                    return Err(e);
                }
                Err(e) => {
                    warn!(what, attempt, error = %e, "attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }

        unreachable!("retry loop returns on the final attempt")
    }
}
