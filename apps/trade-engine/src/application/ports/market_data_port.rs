//! Market data port (driven).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, Symbol, Timestamp};

/// A quote for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Quoted symbol.
    pub symbol: Symbol,
    /// Last/mark price.
    pub price: Money,
    /// When the price was observed.
    pub timestamp: Timestamp,
}

impl Quote {
    /// Create a quote observed now.
    #[must_use]
    pub fn new(symbol: Symbol, price: Money) -> Self {
        Self {
            symbol,
            price,
            timestamp: Timestamp::now(),
        }
    }

    /// Age of this quote relative to `now`, in seconds.
    #[must_use]
    pub fn age_seconds(&self, now: Timestamp) -> i64 {
        now.duration_since(self.timestamp).num_seconds()
    }
}

/// Current market session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSession {
    /// Regular trading hours.
    Open,
    /// Outside regular trading hours.
    Closed,
}

/// Market data errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketDataError {
    /// No price is available for the symbol.
    #[error("No market data available for {symbol}")]
    DataNotAvailable {
        /// Symbol that could not be priced.
        symbol: String,
    },

    /// The freshest available price is too old to act on.
    #[error("Market data for {symbol} is stale ({age_seconds}s old)")]
    Stale {
        /// Symbol with stale data.
        symbol: String,
        /// Age of the stale quote in seconds.
        age_seconds: i64,
    },

    /// Provider could not be reached.
    #[error("Market data connection error: {message}")]
    Connection {
        /// Error details.
        message: String,
    },
}

/// Port for market data lookups.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Get the current quote for a symbol.
    ///
    /// # Errors
    ///
    /// Returns error when no fresh price is available.
    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError>;

    /// Get the current market session state.
    ///
    /// # Errors
    ///
    /// Returns error when the session state cannot be determined.
    async fn market_session(&self) -> Result<MarketSession, MarketDataError>;
}
