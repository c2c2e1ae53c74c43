//! Retry Transport
//!
//! Retries retryable send errors with exponential backoff:
//! `delay = min(min_timeout_ms * retry_factor^attempt, max_timeout_ms)`.
//! Gives up after `max_attempts` calls, or when the next wait would end past
//! `max_retry_ms` since the first call.

use super::TrackerTransport;
use crate::error::TransportError;
use crate::event::TrackerEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total calls to the wrapped transport, first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Overall retry window (milliseconds); unbounded when absent
    #[serde(default)]
    pub max_retry_ms: Option<u64>,
    /// First backoff delay (milliseconds)
    #[serde(default = "default_min_timeout_ms")]
    pub min_timeout_ms: u64,
    /// Backoff ceiling (milliseconds); unbounded when absent
    #[serde(default)]
    pub max_timeout_ms: Option<u64>,
    #[serde(default = "default_retry_factor")]
    pub retry_factor: f64,
}

fn default_max_attempts() -> usize {
    10
}

fn default_min_timeout_ms() -> u64 {
    1000
}

fn default_retry_factor() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            max_retry_ms: None,
            min_timeout_ms: default_min_timeout_ms(),
            max_timeout_ms: None,
            retry_factor: default_retry_factor(),
        }
    }
}

impl RetryConfig {
    /// Wait before retry number `attempt + 1` (zero-based).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw = self.min_timeout_ms as f64 * self.retry_factor.powi(exponent);
        let capped = match self.max_timeout_ms {
            Some(max) => raw.min(max as f64),
            None => raw,
        };
        // Saturates on overflow/infinity.
        Duration::from_millis(capped.min(u64::MAX as f64) as u64)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if !(self.retry_factor >= 1.0) {
            return Err(format!("retry_factor must be >= 1, got {}", self.retry_factor));
        }
        if let Some(max) = self.max_timeout_ms {
            if max < self.min_timeout_ms {
                return Err(format!(
                    "max_timeout_ms ({}) is lower than min_timeout_ms ({})",
                    max, self.min_timeout_ms
                ));
            }
        }
        Ok(())
    }
}

pub struct RetryTransport {
    inner: Arc<dyn TrackerTransport>,
    config: RetryConfig,
}

impl RetryTransport {
    pub fn new(inner: Arc<dyn TrackerTransport>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[async_trait]
impl TrackerTransport for RetryTransport {
    fn transport_name(&self) -> &str {
        "RetryTransport"
    }

    fn is_usable(&self) -> bool {
        self.inner.is_usable()
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<(), TransportError> {
        let started = Instant::now();
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            let err = match self.inner.handle(events.clone()).await {
                Ok(()) => {
                    if attempts > 0 {
                        debug!(attempts = attempts + 1, "Delivered after retrying");
                    }
                    return Ok(());
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };
            attempts += 1;

            if attempts >= max_attempts {
                warn!(attempts, error = %err, "Giving up on batch");
                return Err(TransportError::RetriesExhausted {
                    attempts,
                    last: Box::new(err),
                });
            }

            let delay = self.config.delay_for(attempts - 1);
            if let Some(max_retry_ms) = self.config.max_retry_ms {
                let elapsed = started.elapsed();
                if elapsed + delay > Duration::from_millis(max_retry_ms) {
                    warn!(attempts, elapsed_ms = elapsed.as_millis() as u64, "Retry window exceeded");
                    return Err(TransportError::RetryWindowElapsed {
                        elapsed_ms: elapsed.as_millis() as u64,
                        last: Box::new(err),
                    });
                }
            }

            warn!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Send failed, retrying"
            );
            sleep(delay).await;
        }
    }
}
