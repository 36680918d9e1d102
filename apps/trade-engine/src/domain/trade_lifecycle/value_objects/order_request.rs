//! Inbound order request and pricing variants.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{AccountId, Money, Quantity, Symbol, UserId};
use crate::domain::trade_lifecycle::errors::TradeError;

use super::{AssetClass, TradeSide};

/// Requested pricing for an order.
///
/// A closed tagged-variant type: each broker integration serializes these
/// variants into its own wire format, and no untyped payloads cross layer
/// boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderPricing {
    /// Execute at the prevailing market price.
    Market,
    /// Execute at `limit` or better.
    Limit {
        /// Limit price.
        limit: Money,
    },
    /// Becomes a market order once `stop` trades.
    Stop {
        /// Stop trigger price.
        stop: Money,
    },
    /// Becomes a limit order at `limit` once `stop` trades.
    StopLimit {
        /// Stop trigger price.
        stop: Money,
        /// Limit price after trigger.
        limit: Money,
    },
}

impl OrderPricing {
    /// The limit price, if this pricing carries one.
    #[must_use]
    pub const fn limit_price(&self) -> Option<Money> {
        match self {
            Self::Limit { limit } | Self::StopLimit { limit, .. } => Some(*limit),
            Self::Market | Self::Stop { .. } => None,
        }
    }

    /// The stop trigger price, if this pricing carries one.
    #[must_use]
    pub const fn stop_price(&self) -> Option<Money> {
        match self {
            Self::Stop { stop } | Self::StopLimit { stop, .. } => Some(*stop),
            Self::Market | Self::Limit { .. } => None,
        }
    }

    /// Validate the prices carried by this variant.
    ///
    /// # Errors
    ///
    /// Returns error if any carried price fails order validation.
    pub fn validate(&self) -> Result<(), TradeError> {
        for (field, price) in [("limit_price", self.limit_price()), ("stop_price", self.stop_price())]
        {
            if let Some(price) = price {
                price
                    .validate_for_order()
                    .map_err(|e| TradeError::InvalidParameters {
                        field: field.to_string(),
                        message: e.to_string(),
                    })?;
            }
        }
        Ok(())
    }
}

/// An order request as received from a strategy or command collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Requesting user.
    pub user_id: UserId,
    /// Broker account to trade against.
    pub account_id: AccountId,
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Trade direction.
    pub side: TradeSide,
    /// Asset class of the instrument.
    pub asset_class: AssetClass,
    /// Requested quantity.
    pub quantity: Quantity,
    /// Requested pricing.
    pub pricing: OrderPricing,
    /// Stop-loss exit price, armed at fill time when present.
    pub stop_loss_price: Option<Money>,
    /// Take-profit target price, recorded when present.
    pub take_profit_price: Option<Money>,
    /// Whether this is a simulated (paper) trade.
    pub is_simulation: bool,
}

impl OrderRequest {
    /// Create a market order request.
    #[must_use]
    pub fn market(
        user_id: UserId,
        account_id: AccountId,
        symbol: Symbol,
        side: TradeSide,
        quantity: Quantity,
    ) -> Self {
        Self {
            user_id,
            account_id,
            symbol,
            side,
            asset_class: AssetClass::Equity,
            quantity,
            pricing: OrderPricing::Market,
            stop_loss_price: None,
            take_profit_price: None,
            is_simulation: false,
        }
    }

    /// Create a limit order request.
    #[must_use]
    pub fn limit(
        user_id: UserId,
        account_id: AccountId,
        symbol: Symbol,
        side: TradeSide,
        quantity: Quantity,
        limit: Money,
    ) -> Self {
        Self {
            pricing: OrderPricing::Limit { limit },
            ..Self::market(user_id, account_id, symbol, side, quantity)
        }
    }

    /// Attach a stop-loss exit price.
    #[must_use]
    pub const fn with_stop_loss(mut self, stop_loss: Money) -> Self {
        self.stop_loss_price = Some(stop_loss);
        self
    }

    /// Attach a take-profit target price.
    #[must_use]
    pub const fn with_take_profit(mut self, take_profit: Money) -> Self {
        self.take_profit_price = Some(take_profit);
        self
    }

    /// Mark as a simulated trade.
    #[must_use]
    pub const fn simulated(mut self) -> Self {
        self.is_simulation = true;
        self
    }

    /// Validate the request before it reaches the risk gate.
    ///
    /// # Errors
    ///
    /// Returns error if the symbol, quantity, or prices are invalid.
    pub fn validate(&self) -> Result<(), TradeError> {
        self.symbol
            .validate()
            .map_err(|e| TradeError::InvalidParameters {
                field: "symbol".to_string(),
                message: e.to_string(),
            })?;

        self.quantity
            .validate_for_order()
            .map_err(|e| TradeError::InvalidParameters {
                field: "quantity".to_string(),
                message: e.to_string(),
            })?;

        self.pricing.validate()?;

        if let Some(stop_loss) = self.stop_loss_price {
            stop_loss
                .validate_for_order()
                .map_err(|e| TradeError::InvalidParameters {
                    field: "stop_loss_price".to_string(),
                    message: e.to_string(),
                })?;
        }

        if let Some(take_profit) = self.take_profit_price {
            take_profit
                .validate_for_order()
                .map_err(|e| TradeError::InvalidParameters {
                    field: "take_profit_price".to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(())
    }
}
