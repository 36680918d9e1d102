//! Retry policy with exponential backoff for broker API calls.
//!
//! # Retryable Errors
//!
//! | Retryable | Non-Retryable |
//! |-----------|---------------|
//! | HTTP 429 (Rate Limited) | HTTP 400 (Bad Request) |
//! | HTTP 502/503/504 (Gateway) | HTTP 401/403 (Auth Errors) |
//! | Network timeouts | HTTP 422 (Validation Error) |
//! | Connection reset | Order rejected by broker |
//!
//! Auth errors are not retried here; they take the single transparent
//! credential-refresh path in the HTTP client instead.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry policy configuration for broker API calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (default: 3).
    pub max_attempts: u32,
    /// Initial backoff duration (default: 250ms).
    pub initial_backoff: Duration,
    /// Maximum backoff duration (default: 10s).
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential growth (default: 2.0).
    pub backoff_multiplier: f64,
    /// Jitter factor for randomization (default: 0.2 = ±20%).
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

/// Calculator for exponential backoff with jitter.
#[derive(Debug)]
pub struct BackoffCalculator {
    attempt: u32,
    max_attempts: u32,
    initial_backoff_ms: u64,
    max_backoff_ms: u64,
    backoff_multiplier: f64,
    jitter_factor: f64,
}

impl BackoffCalculator {
    /// Create a new backoff calculator from a retry policy.
    #[must_use]
    pub const fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 0,
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
            backoff_multiplier: policy.backoff_multiplier,
            jitter_factor: policy.jitter_factor,
        }
    }

    /// Get the next backoff duration with jitter.
    ///
    /// Returns `None` once the attempt budget is exhausted.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }

        let base_ms = self.base_backoff_ms();
        let jittered_ms = self.apply_jitter(base_ms).min(self.max_backoff_ms);

        Some(Duration::from_millis(jittered_ms))
    }

    /// Attempts consumed so far.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempt
    }

    fn base_backoff_ms(&self) -> u64 {
        let multiplier = self.backoff_multiplier.powi(self.attempt.saturating_sub(1) as i32);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let backoff = (self.initial_backoff_ms as f64 * multiplier) as u64;
        backoff.min(self.max_backoff_ms)
    }

    /// Random value in [backoff * (1 - jitter), backoff * (1 + jitter)].
    fn apply_jitter(&self, backoff_ms: u64) -> u64 {
        if self.jitter_factor <= 0.0 {
            return backoff_ms;
        }
        let mut rng = rand::rng();
        let jitter_range = backoff_ms as f64 * self.jitter_factor;
        let min = (backoff_ms as f64 - jitter_range).max(0.0);
        let max = backoff_ms as f64 + jitter_range;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let jittered = rng.random_range(min..=max) as u64;
        jittered
    }
}

/// Error category for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient failure; retry with backoff.
    Retryable,
    /// Permanent failure; surface immediately.
    NonRetryable,
    /// Rate limited; prefer Retry-After over backoff.
    RateLimited,
    /// Auth failure; take the credential-refresh path.
    Auth,
}

/// Categorize an HTTP status code for retry handling.
#[must_use]
pub const fn categorize_status(status: u16) -> ErrorCategory {
    match status {
        429 => ErrorCategory::RateLimited,
        401 | 403 => ErrorCategory::Auth,
        408 | 500..=599 => ErrorCategory::Retryable,
        _ => ErrorCategory::NonRetryable,
    }
}

/// Parse a Retry-After header value (seconds form).
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_millis(250));
        assert_eq!(policy.max_backoff, Duration::from_secs(10));
    }

    #[test]
    fn backoff_sequence_without_jitter() {
        let policy = RetryPolicy {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(100),
            jitter_factor: 0.0,
            ..Default::default()
        };
        let mut backoff = BackoffCalculator::new(&policy);

        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(400)));
        // Attempt budget exhausted.
        assert!(backoff.next_backoff().is_none());
        assert_eq!(backoff.attempts(), 4);
    }

    #[test]
    fn backoff_respects_max() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 10.0,
            jitter_factor: 0.0,
        };
        let mut backoff = BackoffCalculator::new(&policy);

        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(1)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(5))); // Capped
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(5))); // Capped
    }

    #[test]
    fn jitter_stays_in_range() {
        let policy = RetryPolicy {
            jitter_factor: 0.2,
            initial_backoff: Duration::from_millis(100),
            ..Default::default()
        };

        for _ in 0..100 {
            let mut backoff = BackoffCalculator::new(&policy);
            let duration = backoff.next_backoff().unwrap();
            // Base is 100ms, jitter ±20%: 80-120ms.
            assert!(
                duration >= Duration::from_millis(80) && duration <= Duration::from_millis(120),
                "Duration {duration:?} not in expected range 80-120ms"
            );
        }
    }

    #[test]
    fn status_categorization() {
        assert_eq!(categorize_status(429), ErrorCategory::RateLimited);
        assert_eq!(categorize_status(401), ErrorCategory::Auth);
        assert_eq!(categorize_status(403), ErrorCategory::Auth);
        assert_eq!(categorize_status(408), ErrorCategory::Retryable);
        assert_eq!(categorize_status(500), ErrorCategory::Retryable);
        assert_eq!(categorize_status(503), ErrorCategory::Retryable);
        assert_eq!(categorize_status(400), ErrorCategory::NonRetryable);
        assert_eq!(categorize_status(404), ErrorCategory::NonRetryable);
        assert_eq!(categorize_status(422), ErrorCategory::NonRetryable);
    }

    #[test]
    fn retry_after_parsing() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after("1"), Some(Duration::from_secs(1)));
        assert!(parse_retry_after("invalid").is_none());
    }
}
