use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::ClientError;

/// Exponential backoff: attempt `n` waits `min(base_delay * 2^n, max_delay)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Reads: three retries.
    pub const fn reads() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(30))
    }

    /// Mutations: a single retry.
    pub const fn mutations() -> Self {
        Self::new(1, Duration::from_secs(1), Duration::from_secs(30))
    }

    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// retries are used up.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        request = what,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::reads()
    }
}
