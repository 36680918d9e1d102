//! Risk gate: pre-broker order validation.
//!
//! Evaluates a proposed order against the user's configured limits,
//! short-circuiting on the first failure. The gate fails closed: when any
//! input cannot be verified the order is denied, never allowed.

use tracing::info;

use crate::domain::shared::Money;
use crate::domain::trade_lifecycle::value_objects::OrderRequest;

use super::super::value_objects::{
    PortfolioSnapshot, RiskDecision, RiskDenial, RiskLimitConfig,
};

/// Inputs gathered for one evaluation.
///
/// Every field is read from durable storage or a live collaborator at
/// evaluation time; `None` marks an input that could not be obtained and
/// resolves to a fail-closed denial.
#[derive(Debug, Clone)]
pub struct RiskInputs {
    /// The user's limits, if they could be loaded.
    pub config: Option<RiskLimitConfig>,
    /// Fresh portfolio snapshot, if one could be taken.
    pub portfolio: Option<PortfolioSnapshot>,
    /// Trades the user placed in the trailing 24 hours, if countable.
    pub trades_last_24h: Option<u32>,
    /// Whether the market is currently open, if known.
    pub market_open: Option<bool>,
}

/// Risk gate service.
#[derive(Debug, Clone)]
pub struct RiskGate {
    /// Snapshots older than this are treated as unverifiable.
    max_snapshot_age_secs: i64,
}

impl RiskGate {
    /// Default maximum snapshot age before the gate fails closed.
    pub const DEFAULT_MAX_SNAPSHOT_AGE_SECS: i64 = 60;

    /// Create a gate with the default snapshot freshness bound.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_snapshot_age_secs: Self::DEFAULT_MAX_SNAPSHOT_AGE_SECS,
        }
    }

    /// Create a gate with a custom snapshot freshness bound.
    #[must_use]
    pub const fn with_max_snapshot_age(max_snapshot_age_secs: i64) -> Self {
        Self {
            max_snapshot_age_secs,
        }
    }

    /// Evaluate an order request against the user's limits.
    ///
    /// `notional` is the order's notional value at the reference price
    /// (limit price, or current quote for market orders). Checks run in
    /// order - position size, concentration, daily count, market state -
    /// and stop at the first failure. The only side effect is an audit log
    /// record; the gate never mutates trade state.
    #[must_use]
    pub fn evaluate(&self, order: &OrderRequest, notional: Money, inputs: &RiskInputs) -> RiskDecision {
        let decision = self.check(order, notional, inputs);

        match &decision {
            RiskDecision::Allow => info!(
                user_id = %order.user_id,
                symbol = %order.symbol,
                side = %order.side,
                notional = %notional,
                decision = "allow",
                "Risk gate evaluation"
            ),
            RiskDecision::Deny(denial) => info!(
                user_id = %order.user_id,
                symbol = %order.symbol,
                side = %order.side,
                notional = %notional,
                decision = "deny",
                reason = %denial,
                "Risk gate evaluation"
            ),
        }

        decision
    }

    fn check(&self, order: &OrderRequest, notional: Money, inputs: &RiskInputs) -> RiskDecision {
        let Some(config) = inputs.config.as_ref() else {
            return RiskDecision::Deny(RiskDenial::Unverifiable {
                source: "risk config".to_string(),
            });
        };

        if config.simulation_only && !order.is_simulation {
            return RiskDecision::Deny(RiskDenial::SimulationOnly);
        }

        // 1. Position size.
        if notional > config.max_position_value {
            return RiskDecision::Deny(RiskDenial::PositionSizeLimit {
                requested: notional,
                limit: config.max_position_value,
            });
        }

        // 2. Concentration, against a fresh snapshot only.
        let Some(portfolio) = inputs.portfolio.as_ref() else {
            return RiskDecision::Deny(RiskDenial::Unverifiable {
                source: "portfolio snapshot".to_string(),
            });
        };
        if portfolio.age_seconds(crate::domain::shared::Timestamp::now())
            > self.max_snapshot_age_secs
        {
            return RiskDecision::Deny(RiskDenial::Unverifiable {
                source: "portfolio snapshot (stale)".to_string(),
            });
        }
        let Some(resulting) = portfolio.concentration_after(&order.symbol, notional) else {
            return RiskDecision::Deny(RiskDenial::Unverifiable {
                source: "portfolio value".to_string(),
            });
        };
        if resulting > config.max_symbol_concentration {
            return RiskDecision::Deny(RiskDenial::ConcentrationLimit {
                resulting,
                limit: config.max_symbol_concentration,
            });
        }

        // 3. Rolling 24h trade count, from durable rows.
        let Some(placed) = inputs.trades_last_24h else {
            return RiskDecision::Deny(RiskDenial::Unverifiable {
                source: "daily trade count".to_string(),
            });
        };
        if placed >= config.max_daily_trades {
            return RiskDecision::Deny(RiskDenial::DailyTradeLimit {
                placed,
                limit: config.max_daily_trades,
            });
        }

        // 4. Market state, when configured.
        if config.enforce_market_hours {
            match inputs.market_open {
                Some(true) => {}
                Some(false) => return RiskDecision::Deny(RiskDenial::MarketClosed),
                None => {
                    return RiskDecision::Deny(RiskDenial::Unverifiable {
                        source: "market session".to_string(),
                    });
                }
            }
        }

        RiskDecision::Allow
    }
}

impl Default for RiskGate {
    fn default() -> Self {
        Self::new()
    }
}
