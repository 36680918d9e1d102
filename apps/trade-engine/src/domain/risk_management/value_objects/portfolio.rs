//! Portfolio snapshot consumed by the risk gate.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{Money, Symbol, Timestamp};

/// Point-in-time view of a user's portfolio.
///
/// Exposure is derived on demand from non-terminal trades (the net position
/// per symbol); it is never persisted or cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Total portfolio value.
    pub total_value: Money,
    /// Current notional exposure per symbol.
    pub exposure_by_symbol: HashMap<Symbol, Money>,
    /// When the snapshot was taken.
    pub taken_at: Timestamp,
}

impl PortfolioSnapshot {
    /// Create a snapshot taken now.
    #[must_use]
    pub fn new(total_value: Money) -> Self {
        Self {
            total_value,
            exposure_by_symbol: HashMap::new(),
            taken_at: Timestamp::now(),
        }
    }

    /// Record exposure for a symbol.
    #[must_use]
    pub fn with_exposure(mut self, symbol: Symbol, exposure: Money) -> Self {
        self.exposure_by_symbol.insert(symbol, exposure);
        self
    }

    /// Current exposure for a symbol (zero when none).
    #[must_use]
    pub fn exposure(&self, symbol: &Symbol) -> Money {
        self.exposure_by_symbol
            .get(symbol)
            .copied()
            .unwrap_or(Money::ZERO)
    }

    /// Concentration a new notional would create in `symbol`, as a fraction
    /// of total portfolio value. Returns None when total value is zero.
    #[must_use]
    pub fn concentration_after(&self, symbol: &Symbol, added_notional: Money) -> Option<Decimal> {
        if self.total_value.amount() <= Decimal::ZERO {
            return None;
        }
        let combined = self.exposure(symbol) + added_notional;
        Some(combined.amount() / self.total_value.amount())
    }

    /// Age of this snapshot relative to `now`, in seconds.
    #[must_use]
    pub fn age_seconds(&self, now: Timestamp) -> i64 {
        now.duration_since(self.taken_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposure_defaults_to_zero() {
        let snapshot = PortfolioSnapshot::new(Money::usd(100_000.0));
        assert_eq!(snapshot.exposure(&Symbol::new("AAPL")), Money::ZERO);
    }

    #[test]
    fn concentration_after_combines_existing_exposure() {
        let snapshot = PortfolioSnapshot::new(Money::usd(100_000.0))
            .with_exposure(Symbol::new("AAPL"), Money::usd(18_000.0));

        // 18% existing + 8% new = 26%
        let concentration = snapshot
            .concentration_after(&Symbol::new("AAPL"), Money::usd(8_000.0))
            .unwrap();
        assert_eq!(concentration, Decimal::new(26, 2));
    }

    #[test]
    fn concentration_after_zero_portfolio_is_none() {
        let snapshot = PortfolioSnapshot::new(Money::ZERO);
        assert!(snapshot
            .concentration_after(&Symbol::new("AAPL"), Money::usd(1_000.0))
            .is_none());
    }

    #[test]
    fn age_seconds() {
        let mut snapshot = PortfolioSnapshot::new(Money::usd(1000.0));
        snapshot.taken_at = Timestamp::parse("2026-03-02T12:00:00Z").unwrap();
        let now = Timestamp::parse("2026-03-02T12:01:30Z").unwrap();
        assert_eq!(snapshot.age_seconds(now), 90);
    }
}
