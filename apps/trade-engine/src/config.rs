//! Engine configuration from the environment.

use std::time::Duration;

use crate::application::use_cases::SentinelConfig;
use crate::infrastructure::broker::schwab::SchwabGatewayConfig;

/// Top-level engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Broker gateway configuration.
    pub gateway: SchwabGatewayConfig,
    /// Sentinel sweep configuration.
    pub sentinel: SentinelConfig,
}

impl EngineConfig {
    /// Load configuration from the environment.
    ///
    /// - `TRADING_ENV`: `live` or `paper` (default: paper)
    /// - `SCHWAB_BASE_URL`: override the API base URL
    /// - `BROKER_TIMEOUT_SECS`: request timeout (default: 30)
    /// - `SENTINEL_INTERVAL_SECS`: sweep period (default: 60)
    /// - `SENTINEL_CLOSE_ATTEMPT_CEILING`: force-close retries before
    ///   operator escalation (default: 5)
    #[must_use]
    pub fn from_env() -> Self {
        let live = std::env::var("TRADING_ENV")
            .map(|v| v.eq_ignore_ascii_case("live"))
            .unwrap_or(false);

        let mut gateway = if live {
            SchwabGatewayConfig::live()
        } else {
            SchwabGatewayConfig::paper("https://api.schwabapi.com/trader/v1")
        };

        if let Ok(base_url) = std::env::var("SCHWAB_BASE_URL") {
            gateway.base_url = base_url;
        }
        if let Some(timeout) = env_u64("BROKER_TIMEOUT_SECS") {
            gateway.timeout = Duration::from_secs(timeout);
        }

        let mut sentinel = SentinelConfig::default();
        if let Some(interval) = env_u64("SENTINEL_INTERVAL_SECS") {
            sentinel.interval_secs = interval;
        }
        if let Some(ceiling) = env_u64("SENTINEL_CLOSE_ATTEMPT_CEILING") {
            sentinel.close_attempt_ceiling = u32::try_from(ceiling).unwrap_or(u32::MAX);
        }

        Self { gateway, sentinel }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::broker::schwab::SchwabEnvironment;

    #[test]
    fn defaults_are_paper_with_60s_sentinel() {
        let config = EngineConfig::from_env();
        assert_eq!(config.gateway.environment, SchwabEnvironment::Paper);
        assert_eq!(config.sentinel.interval_secs, 60);
        assert_eq!(config.sentinel.close_attempt_ceiling, 5);
        assert_eq!(config.gateway.timeout, Duration::from_secs(30));
    }
}
