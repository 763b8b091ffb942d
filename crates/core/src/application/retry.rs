// Retry logic for storage calls
use crate::error::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

/// Retry bounds read once at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 100,
            backoff_factor: 2.0,
            max_delay_ms: 2000,
        }
    }
}

/// Bounded retry with exponential backoff
///
/// Only transient errors (lock contention, connection loss) are retried.
/// Anything else is returned on the first failure.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Backoff before retry number `attempt` (0-based)
    ///
    /// Backoff formula:
    /// delay = min(base_delay * (backoff_factor ^ attempt), max_delay) * (1.0 ± 0.1)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let raw = self.config.base_delay_ms as f64 * self.config.backoff_factor.powi(attempt as i32);
        let capped = raw.min(self.config.max_delay_ms as f64);

        // ±10% jitter so instances contending on one key do not retry in lockstep
        let jitter_factor = rand::thread_rng().gen_range(0.9..=1.1);

        Duration::from_millis((capped * jitter_factor) as u64)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = operation,
                        attempt = attempt + 1,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        error!(
                            operation = operation,
                            max_attempts = max_attempts,
                            error = %e,
                            "Retry attempts exhausted"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}
