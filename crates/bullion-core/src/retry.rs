//! Bounded retry with fixed or exponential backoff.

use std::thread;
use std::time::Duration;

use serde::Serializer;
use tracing::debug;

use crate::SourceError;

/// Backoff strategy for retrying failed provider calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Uses an exponential delay between retries.
    ///
    /// The delay is calculated as `base * (factor ^ attempt)`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum duration to wait between retries.
        max: Duration,
        /// Whether to apply random jitter (+/- 50%) to the delay.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed {
            delay: Duration::from_secs(1),
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let seconds = base.as_secs_f64() * factor.powi(exponent);
                let capped_seconds = seconds.min(max.as_secs_f64());
                let delay = Duration::from_secs_f64(capped_seconds);

                if !jitter {
                    return delay;
                }

                let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                let spread = millis / 2;
                let offset = fastrand::u64(0..=spread.saturating_mul(2));
                Duration::from_millis((millis - spread).saturating_add(offset))
            }
        }
    }
}

/// Retry policy for provider calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Enables or disables the retry mechanism.
    pub enabled: bool,
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(1), 3)
    }
}

impl RetryConfig {
    pub fn exponential(max_retries: u32, base: Duration, max: Duration) -> Self {
        Self {
            enabled: true,
            max_retries,
            backoff: Backoff::Exponential {
                base,
                factor: 2.0,
                max,
                jitter: true,
            },
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            enabled: true,
            max_retries,
            backoff: Backoff::Fixed { delay },
        }
    }

    pub fn no_retry() -> Self {
        Self {
            enabled: false,
            max_retries: 0,
            backoff: Backoff::Fixed {
                delay: Duration::ZERO,
            },
        }
    }

    pub const fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

/// Result of a retried call plus what it cost.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T, SourceError>,
    pub attempts: u32,
    /// Total time spent sleeping between attempts.
    pub waited: Duration,
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent. `op` receives the 0-based attempt number.
pub fn call_with_retry<T, F>(config: &RetryConfig, mut op: F) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Result<T, SourceError>,
{
    let max_attempts = config.max_attempts();
    let mut waited = Duration::ZERO;
    let mut attempt = 0;

    loop {
        let result = op(attempt);
        attempt += 1;

        let error = match result {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt,
                    waited,
                }
            }
            Err(error) => error,
        };

        if !error.retryable() || attempt >= max_attempts {
            return RetryOutcome {
                result: Err(error),
                attempts: attempt,
                waited,
            };
        }

        let delay = config.delay_for_attempt(attempt - 1);
        debug!(attempt, delay_ms = delay.as_millis() as u64, error = %error, "retrying provider call");
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        waited += delay;
    }
}

/// Serializes an optional accumulated delay as whole milliseconds.
pub(crate) fn serialize_delay_ms<S>(
    value: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(delay) => {
            let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            serializer.serialize_some(&millis)
        }
        None => serializer.serialize_none(),
    }
}
