//! Risk gate decision types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::Money;

/// The specific limit a denied order breached.
///
/// Denials always name the limit and carry the observed vs configured
/// values; they are never downgraded to a generic rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RiskDenial {
    /// Requested notional exceeds the max single position value.
    PositionSizeLimit {
        /// Requested notional.
        requested: Money,
        /// Configured limit.
        limit: Money,
    },
    /// Order would push symbol concentration over the cap.
    ConcentrationLimit {
        /// Concentration the order would create (fraction of portfolio).
        resulting: Decimal,
        /// Configured cap (fraction of portfolio).
        limit: Decimal,
    },
    /// User has exhausted the rolling 24-hour trade allowance.
    DailyTradeLimit {
        /// Trades placed in the trailing window.
        placed: u32,
        /// Configured allowance.
        limit: u32,
    },
    /// Market is closed and the user's config rejects after-hours orders.
    MarketClosed,
    /// Live order from a simulation-only account.
    SimulationOnly,
    /// A required input could not be verified; the gate fails closed.
    Unverifiable {
        /// Which input was unavailable.
        source: String,
    },
}

impl fmt::Display for RiskDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PositionSizeLimit { requested, limit } => {
                write!(
                    f,
                    "position size limit exceeded: requested {requested}, limit {limit}"
                )
            }
            Self::ConcentrationLimit { resulting, limit } => {
                write!(
                    f,
                    "concentration limit exceeded: {:.1}% > {:.1}%",
                    resulting * Decimal::from(100),
                    limit * Decimal::from(100)
                )
            }
            Self::DailyTradeLimit { placed, limit } => {
                write!(
                    f,
                    "daily trade limit exceeded: {placed} placed in trailing 24h, limit {limit}"
                )
            }
            Self::MarketClosed => write!(f, "market is closed"),
            Self::SimulationOnly => {
                write!(f, "account is restricted to simulated trades")
            }
            Self::Unverifiable { source } => {
                write!(f, "risk inputs unavailable ({source}); failing closed")
            }
        }
    }
}

/// Outcome of a risk gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskDecision {
    /// Order may proceed to the broker.
    Allow,
    /// Order is denied with the specific limit breached.
    Deny(RiskDenial),
}

impl RiskDecision {
    /// True when the order was allowed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// The denial, if the order was denied.
    #[must_use]
    pub const fn denial(&self) -> Option<&RiskDenial> {
        match self {
            Self::Allow => None,
            Self::Deny(denial) => Some(denial),
        }
    }
}
