//! Schwab gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::infrastructure::broker::retry::RetryPolicy;

/// Trading environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchwabEnvironment {
    /// Paper/sandbox trading.
    Paper,
    /// Live trading against real money.
    Live,
}

impl SchwabEnvironment {
    /// True for live trading.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

/// Configuration for the Schwab broker gateway.
#[derive(Debug, Clone)]
pub struct SchwabGatewayConfig {
    /// Trading environment.
    pub environment: SchwabEnvironment,
    /// Trader API base URL.
    pub base_url: String,
    /// Bounded per-request timeout. A timed-out call is a retryable
    /// connection error, never assumed successful.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl SchwabGatewayConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Paper-trading configuration against the given base URL.
    #[must_use]
    pub fn paper(base_url: impl Into<String>) -> Self {
        Self {
            environment: SchwabEnvironment::Paper,
            base_url: base_url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Live-trading configuration against the production API.
    #[must_use]
    pub fn live() -> Self {
        Self {
            environment: SchwabEnvironment::Live,
            base_url: "https://api.schwabapi.com/trader/v1".to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}
