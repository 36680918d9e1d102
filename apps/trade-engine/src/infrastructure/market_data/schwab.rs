//! Schwab market data adapter.
//!
//! Quotes come from the market-data API under a dedicated data connection
//! user; quotes older than the staleness bound are refused rather than
//! acted on.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    CredentialProvider, MarketDataError, MarketDataProvider, MarketSession, Quote,
};
use crate::domain::shared::{Money, Symbol, Timestamp, UserId};
use crate::infrastructure::broker::schwab::{
    SchwabError, SchwabGatewayConfig, SchwabHttpClient,
};

/// Configuration for the Schwab market data adapter.
#[derive(Debug, Clone)]
pub struct SchwabMarketDataConfig {
    /// Gateway config (base URL, timeout, retry).
    pub gateway: SchwabGatewayConfig,
    /// User whose credential authorizes data calls.
    pub data_user: UserId,
    /// Maximum quote age before it is treated as stale, in seconds.
    pub max_quote_age_secs: i64,
}

/// Quote payload from the market-data API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchwabQuoteResponse {
    last_price: Decimal,
    quote_time: Option<String>,
}

/// Market hours payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchwabMarketHoursResponse {
    is_open: bool,
}

/// Market data over the Schwab API.
pub struct SchwabMarketDataAdapter {
    client: SchwabHttpClient,
    data_user: UserId,
    max_quote_age_secs: i64,
}

impl SchwabMarketDataAdapter {
    /// Create a new adapter.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        config: SchwabMarketDataConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, SchwabError> {
        let client = SchwabHttpClient::new(config.gateway, credentials)?;
        Ok(Self {
            client,
            data_user: config.data_user,
            max_quote_age_secs: config.max_quote_age_secs,
        })
    }
}

#[async_trait]
impl MarketDataProvider for SchwabMarketDataAdapter {
    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
        let response: SchwabQuoteResponse = self
            .client
            .get(&self.data_user, &format!("/{symbol}/quotes"))
            .await
            .map_err(|e| match e {
                SchwabError::OrderNotFound { .. } => MarketDataError::DataNotAvailable {
                    symbol: symbol.as_str().to_string(),
                },
                other => MarketDataError::Connection {
                    message: other.to_string(),
                },
            })?;

        let timestamp = response
            .quote_time
            .as_deref()
            .and_then(|t| Timestamp::parse(t).ok())
            .unwrap_or_else(Timestamp::now);

        let age = Timestamp::now().duration_since(timestamp).num_seconds();
        if age > self.max_quote_age_secs {
            return Err(MarketDataError::Stale {
                symbol: symbol.as_str().to_string(),
                age_seconds: age,
            });
        }

        Ok(Quote {
            symbol: symbol.clone(),
            price: Money::new(response.last_price),
            timestamp,
        })
    }

    async fn market_session(&self) -> Result<MarketSession, MarketDataError> {
        let response: SchwabMarketHoursResponse = self
            .client
            .get(&self.data_user, "/markets/equity")
            .await
            .map_err(|e| MarketDataError::Connection {
                message: e.to_string(),
            })?;

        Ok(if response.is_open {
            MarketSession::Open
        } else {
            MarketSession::Closed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_response_deserializes() {
        let json = "{\"lastPrice\":\"150.25\",\"quoteTime\":\"2026-03-02T14:30:00Z\"}";
        let response: SchwabQuoteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.last_price, Decimal::new(15025, 2));
        assert!(response.quote_time.is_some());
    }

    #[test]
    fn market_hours_deserializes() {
        let response: SchwabMarketHoursResponse =
            serde_json::from_str("{\"isOpen\":true}").unwrap();
        assert!(response.is_open);
    }
}
