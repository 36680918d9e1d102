//! Trade side (buy/sell).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    /// Buy (long entry or short cover).
    Buy,
    /// Sell (long exit or short entry).
    Sell,
}

impl TradeSide {
    /// The side that flattens a position opened on this side.
    #[must_use]
    pub const fn closing_side(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Asset class of the traded instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Listed equity.
    Equity,
    /// Crypto pair.
    Crypto,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equity => write!(f, "equity"),
            Self::Crypto => write!(f, "crypto"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_side_flips_direction() {
        assert_eq!(TradeSide::Buy.closing_side(), TradeSide::Sell);
        assert_eq!(TradeSide::Sell.closing_side(), TradeSide::Buy);
    }

    #[test]
    fn trade_side_display() {
        assert_eq!(format!("{}", TradeSide::Buy), "buy");
        assert_eq!(format!("{}", TradeSide::Sell), "sell");
    }

    #[test]
    fn trade_side_serde() {
        assert_eq!(serde_json::to_string(&TradeSide::Buy).unwrap(), "\"buy\"");
        let parsed: TradeSide = serde_json::from_str("\"sell\"").unwrap();
        assert_eq!(parsed, TradeSide::Sell);
    }

    #[test]
    fn asset_class_display() {
        assert_eq!(format!("{}", AssetClass::Equity), "equity");
        assert_eq!(format!("{}", AssetClass::Crypto), "crypto");
    }
}
