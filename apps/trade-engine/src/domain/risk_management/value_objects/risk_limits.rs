//! Per-user risk limit configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::shared::Money;

/// Risk limits configured per user.
///
/// Read-only to the risk gate; owned by the user account entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLimitConfig {
    /// Maximum notional value of a single position.
    pub max_position_value: Money,
    /// Maximum fraction of portfolio value in one symbol (0..=1).
    pub max_symbol_concentration: Decimal,
    /// Maximum trades in a rolling 24-hour window.
    pub max_daily_trades: u32,
    /// User may only place simulated trades.
    pub simulation_only: bool,
    /// Reject orders outside market hours.
    pub enforce_market_hours: bool,
}

impl RiskLimitConfig {
    /// Conservative defaults for a standard account.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            max_position_value: Money::usd(10_000.0),
            max_symbol_concentration: dec!(0.25),
            max_daily_trades: 25,
            simulation_only: false,
            enforce_market_hours: true,
        }
    }
}

impl Default for RiskLimitConfig {
    fn default() -> Self {
        Self::standard()
    }
}
