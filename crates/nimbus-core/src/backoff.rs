//! Retry timing and retry eligibility.
//!
//! [`BackoffStrategy`] is a pure value: it computes how long to wait before a
//! given retry attempt and decides whether a status/method pair may be retried
//! at all. It holds no state and can be shared read-only across clients.

use rand::Rng;
use reqwest::Method;
use std::time::Duration;

/// Default delay before the first retry, in milliseconds.
pub const DEFAULT_INITIAL_INTERVAL_MS: u64 = 100;

/// Default cap on the computed delay, in milliseconds.
pub const DEFAULT_MAX_INTERVAL_MS: u64 = 5000;

/// Default growth factor between attempts.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const JITTER_LOW: f64 = 0.75;
const JITTER_HIGH: f64 = 1.25;

/// Exponential backoff with optional jitter.
///
/// The delay for attempt `n` is `initial_interval * multiplier^n`, capped at
/// `max_interval`. Jitter scales the capped value by a random factor in
/// `[0.75, 1.25]`, so a jittered delay can exceed `max_interval` by up to 25%.
/// Callers and tests depend on that ordering; it is not a bug.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffStrategy {
    /// Delay before the first retry
    pub initial_interval: Duration,

    /// Cap applied before jitter
    pub max_interval: Duration,

    /// Growth factor, never below 1.0
    pub multiplier: f64,

    /// Maximum number of retries
    pub max_retries: u32,

    /// Randomize delays by ±25%
    pub jitter: bool,
}

impl BackoffStrategy {
    /// Create a strategy with the default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initial_interval: Duration::from_millis(DEFAULT_INITIAL_INTERVAL_MS),
            max_interval: Duration::from_millis(DEFAULT_MAX_INTERVAL_MS),
            multiplier: DEFAULT_MULTIPLIER,
            max_retries: DEFAULT_MAX_RETRIES,
            jitter: true,
        }
    }

    /// Create a strategy that never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            multiplier: 1.0,
            max_retries: 0,
            jitter: false,
        }
    }

    /// Set the initial interval.
    #[must_use]
    pub const fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Set the maximum interval.
    #[must_use]
    pub const fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Set the multiplier. Values below 1.0 (and NaN) are raised to 1.0.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = if multiplier >= 1.0 { multiplier } else { 1.0 };
        self
    }

    /// Set the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Enable or disable jitter.
    #[must_use]
    pub const fn with_jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    /// Delay to wait after the failure of the zero-indexed `attempt`.
    ///
    /// Negative attempts are treated as attempt 0.
    #[must_use]
    pub fn duration(&self, attempt: impl Into<i64>) -> Duration {
        let base = self.base_duration(attempt.into());
        if self.jitter {
            base.mul_f64(rand::rng().random_range(JITTER_LOW..=JITTER_HIGH))
        } else {
            base
        }
    }

    fn base_duration(&self, attempt: i64) -> Duration {
        let exponent = i32::try_from(attempt.max(0)).unwrap_or(i32::MAX);
        let cap = self.max_interval.as_nanos() as f64;
        let scaled = self.initial_interval.as_nanos() as f64 * self.multiplier.powi(exponent);

        if scaled.is_finite() && scaled < cap {
            Duration::from_nanos(scaled as u64)
        } else {
            self.max_interval
        }
    }

    /// True while `attempt` (zero-indexed) is below `max_retries`.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// See [`is_retryable_status`].
    #[must_use]
    pub const fn is_retryable_status(&self, status: u16) -> bool {
        is_retryable_status(status)
    }

    /// See [`is_retryable_method`].
    #[must_use]
    pub fn is_retryable_method(&self, method: &Method) -> bool {
        is_retryable_method(method)
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::new()
    }
}

/// Transient overload statuses: 429, 502, 503 and 504.
#[must_use]
pub const fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 502 | 503 | 504)
}

/// Only GET and HEAD are retried automatically.
#[must_use]
pub fn is_retryable_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}
