//! Fixed market data source for development and testing.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::application::ports::{MarketDataError, MarketDataProvider, MarketSession, Quote};
use crate::domain::shared::{Money, Symbol};

/// In-memory market data with settable prices and session state.
#[derive(Debug)]
pub struct FixedMarketData {
    prices: RwLock<HashMap<String, Money>>,
    session: RwLock<MarketSession>,
}

impl FixedMarketData {
    /// Create with no prices and the market open.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
            session: RwLock::new(MarketSession::Open),
        }
    }

    /// Set the price for a symbol.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn set_price(&self, symbol: &str, price: Money) {
        let mut prices = self
            .prices
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        prices.insert(Symbol::new(symbol).into_inner(), price);
    }

    /// Remove the price for a symbol (simulates missing data).
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn clear_price(&self, symbol: &str) {
        let mut prices = self
            .prices
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        prices.remove(Symbol::new(symbol).as_str());
    }

    /// Set the market session state.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn set_session(&self, session: MarketSession) {
        *self
            .session
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = session;
    }
}

impl Default for FixedMarketData {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for FixedMarketData {
    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, MarketDataError> {
        let prices = self
            .prices
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        prices
            .get(symbol.as_str())
            .map(|price| Quote::new(symbol.clone(), *price))
            .ok_or_else(|| MarketDataError::DataNotAvailable {
                symbol: symbol.as_str().to_string(),
            })
    }

    async fn market_session(&self) -> Result<MarketSession, MarketDataError> {
        Ok(*self
            .session
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_quote_returns_set_price() {
        let data = FixedMarketData::new();
        data.set_price("AAPL", Money::usd(150.0));

        let quote = data.get_quote(&Symbol::new("AAPL")).await.unwrap();
        assert_eq!(quote.price, Money::usd(150.0));
    }

    #[tokio::test]
    async fn missing_price_is_data_not_available() {
        let data = FixedMarketData::new();
        let result = data.get_quote(&Symbol::new("AAPL")).await;
        assert!(matches!(
            result,
            Err(MarketDataError::DataNotAvailable { .. })
        ));
    }

    #[tokio::test]
    async fn clear_price_removes_quote() {
        let data = FixedMarketData::new();
        data.set_price("AAPL", Money::usd(150.0));
        data.clear_price("AAPL");

        assert!(data.get_quote(&Symbol::new("AAPL")).await.is_err());
    }

    #[tokio::test]
    async fn session_round_trips() {
        let data = FixedMarketData::new();
        assert_eq!(data.market_session().await.unwrap(), MarketSession::Open);

        data.set_session(MarketSession::Closed);
        assert_eq!(data.market_session().await.unwrap(), MarketSession::Closed);
    }
}
