//! Retry policy with exponential backoff
//!
//! Only server-side failures (5xx) and connection problems are retried;
//! client errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use log::warn;
use rand::Rng;

use crate::api::error::ClientError;

/// Backoff parameters for a single Gateway call
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first call
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Randomize each delay within [50%, 100%] of its nominal value
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4, // one call plus three retries
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn conservative() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    pub fn aggressive() -> Self {
        Self {
            max_attempts: 6,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 1.5,
            jitter: true,
        }
    }

    /// A single attempt, no waiting
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Nominal delay before retry number `retry` (1-based), before jitter
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let nominal = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = nominal.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

/// Executes Gateway calls under a [`RetryConfig`]
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `call` until it succeeds, fails terminally or attempts run out
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut call: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.jittered(self.config.delay_for(attempt));
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        operation, attempt, max_attempts, err, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if !self.config.jitter || delay.is_zero() {
            return delay;
        }
        let factor: f64 = rand::rng().random_range(0.5..=1.0);
        delay.mul_f64(factor)
    }
}
