//! Adverse-breach detection for protected positions.

use crate::domain::shared::Money;
use crate::domain::trade_lifecycle::value_objects::TradeSide;

/// Result of checking a price against a stop level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachCheck {
    /// Price has not breached the stop.
    None,
    /// Adverse breach; the position must be flattened.
    StopBreached {
        /// Price observed at the breach.
        price: Money,
    },
}

impl BreachCheck {
    /// True when a breach occurred.
    #[must_use]
    pub const fn is_breached(&self) -> bool {
        matches!(self, Self::StopBreached { .. })
    }
}

/// Detects adverse stop breaches for long and short positions.
pub struct BreachDetector;

impl BreachDetector {
    /// Check a current price against the stop for a position opened on
    /// `entry_side`.
    ///
    /// A long position (entered with Buy) breaches when the price trades at
    /// or below the stop; a short position (entered with Sell) breaches
    /// when the price trades at or above the stop.
    #[must_use]
    pub fn check(entry_side: TradeSide, current_price: Money, stop_price: Money) -> BreachCheck {
        let breached = match entry_side {
            TradeSide::Buy => current_price <= stop_price,
            TradeSide::Sell => current_price >= stop_price,
        };

        if breached {
            BreachCheck::StopBreached {
                price: current_price,
            }
        } else {
            BreachCheck::None
        }
    }
}
