//! Retry policy with exponential backoff and jitter
//!
//! The schedule is a pure function of the attempt number, an optional
//! `Retry-After` floor and a jitter sample, so it can be tested without I/O.
//! The fetcher consumes [`AttemptOutcome`] values in a bounded loop.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::utils::error::{is_retryable_status, FetchError};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    pub base_delay_ms: u64,

    /// Multiplier applied per further retry
    pub backoff_factor: f64,

    /// Maximum backoff delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,

    /// Upper bound of the random jitter added to each delay
    pub jitter_ms: u64,

    /// Upper bound honored for a server-provided `Retry-After`
    pub max_retry_after_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 1000,
            backoff_factor: 2.0,
            max_delay_ms: 8000,
            jitter_ms: 250,
            max_retry_after_ms: 60_000,
        }
    }
}

/// Result of one physical request
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Body received
    Success(String),

    /// Transient failure; `retry_after` is a floor on the next delay
    Retryable {
        cause: FetchError,
        retry_after: Option<Duration>,
    },

    /// 3xx answer pointing at another URL; following it is a new request
    Redirect(url::Url),

    /// Failure that another attempt cannot fix
    Fatal(FetchError),
}

impl RetryPolicy {
    /// Create a policy with a custom attempt budget
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Create a policy with custom delays and no jitter
    pub fn with_delays(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
            jitter_ms: 0,
            ..Default::default()
        }
    }

    /// Backoff before the retry that follows failed attempt number `attempt` (1-based)
    ///
    /// `base * factor^(attempt-1)`, capped at `max_delay_ms`, plus `jitter`.
    /// A `retry_after` hint, itself capped at `max_retry_after_ms`, acts as a floor.
    pub fn delay_for(
        &self,
        attempt: u32,
        retry_after: Option<Duration>,
        jitter: Duration,
    ) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let exponential = self.base_delay_ms as f64 * self.backoff_factor.powi(exponent);
        let capped = if exponential.is_finite() {
            (exponential as u64).min(self.max_delay_ms)
        } else {
            self.max_delay_ms
        };

        let backoff = Duration::from_millis(capped) + jitter;

        match retry_after {
            Some(hint) => {
                let floor = hint.min(Duration::from_millis(self.max_retry_after_ms));
                backoff.max(floor)
            }
            None => backoff,
        }
    }

    /// Draw a random jitter sample in `[0, jitter_ms]`
    pub fn sample_jitter(&self) -> Duration {
        if self.jitter_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(0..=self.jitter_ms);
        Duration::from_millis(ms)
    }

    /// Whether another attempt is allowed after `attempt` failed
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Classify a non-success HTTP status
    pub fn classify_status(status: u16, retry_after: Option<Duration>) -> AttemptOutcome {
        if is_retryable_status(status) {
            AttemptOutcome::Retryable {
                cause: FetchError::Status(status),
                retry_after,
            }
        } else {
            AttemptOutcome::Fatal(FetchError::Status(status))
        }
    }

    /// Classify a transport-level failure
    pub fn classify_transport(err: reqwest::Error) -> AttemptOutcome {
        let cause = FetchError::from_transport(err);
        if cause.is_recoverable() {
            AttemptOutcome::Retryable {
                cause,
                retry_after: None,
            }
        } else {
            AttemptOutcome::Fatal(cause)
        }
    }
}

/// Parse a `Retry-After` header value
///
/// Accepts delta-seconds (`"120"`) or an HTTP-date
/// (`"Wed, 21 Oct 2015 07:28:00 GMT"`). Dates in the past yield zero.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();

    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = at.with_timezone(&Utc) - now;
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}
