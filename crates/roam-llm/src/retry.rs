//! Same-model retry with exponential backoff
//!
//! Sits underneath cross-model fallback: a model's local retries are
//! exhausted before the orchestrator moves on to another model.

use std::future::Future;
use std::time::Duration;

use roam_config::RetryConfig;

use crate::error::LlmError;

/// How often, and how patiently, one model is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; zero is treated as one
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            base_delay,
        }
    }

    /// Single attempt, no retry
    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the `failed_attempt`-th failure (1-based): base, 2×base, 4×base...
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out
    ///
    /// Only [`LlmError::Transient`] failures are retried. `call` receives the
    /// 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, model: &str, mut call: F) -> Result<T, LlmError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt = 1;
        loop {
            match call(attempt).await {
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        model,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "transient failure, retrying same model"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay)
    }
}
