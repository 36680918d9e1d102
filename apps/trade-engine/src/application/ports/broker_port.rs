//! Broker order gateway port (driven).
//!
//! Interface to the external brokerage for place/cancel/replace/executions.
//! Adapters own retry, backoff, and error classification; the taxonomy here
//! is what the rest of the engine sees.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{AccountId, BrokerOrderId, Quantity, Symbol, TradeId, UserId};
use crate::domain::trade_lifecycle::value_objects::{FillEvent, OrderPricing, TradeSide};

/// An order as handed to a broker gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerOrder {
    /// Engine trade id, passed through for idempotent correlation.
    pub trade_id: TradeId,
    /// User whose credential authorizes the call.
    pub user_id: UserId,
    /// Broker account to trade against.
    pub account_id: AccountId,
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Order side.
    pub side: TradeSide,
    /// Quantity.
    pub quantity: Quantity,
    /// Pricing variant, serialized per integration.
    pub pricing: OrderPricing,
}

/// New terms for a replace request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceTerms {
    /// Replacement pricing.
    pub pricing: OrderPricing,
    /// Replacement quantity, when the remainder is resized.
    pub quantity: Option<Quantity>,
}

/// Broker gateway error taxonomy.
///
/// Only `Connection` and `RateLimited` are transient; everything else
/// surfaces to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Account lacks buying power for the order.
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// Broker rejected the order parameters.
    #[error("Invalid order: {reason}")]
    InvalidOrder {
        /// Rejection detail from the broker.
        reason: String,
    },

    /// Market is closed for this order type.
    #[error("Market closed")]
    MarketClosed,

    /// Credential was rejected and could not be refreshed.
    #[error("Authentication failed; re-authorization required")]
    ReauthRequired,

    /// Bearer token expired mid-call.
    #[error("Access token expired")]
    TokenExpired,

    /// Broker is rate limiting; honor `retry_after_secs` when present.
    #[error("Rate limited by broker")]
    RateLimited {
        /// Suggested retry delay in seconds.
        retry_after_secs: Option<u64>,
    },

    /// Connection-class failure, including timeouts and retry exhaustion.
    #[error("Broker connection error: {message}")]
    Connection {
        /// Error details (last error when retries are exhausted).
        message: String,
    },

    /// Order id unknown at the broker.
    #[error("Order not found: {order_id}")]
    OrderNotFound {
        /// The missing order id.
        order_id: String,
    },

    /// Order rejected for a reason outside the taxonomy above.
    #[error("Order rejected: {reason}")]
    Rejected {
        /// Rejection reason.
        reason: String,
    },
}

impl GatewayError {
    /// True for transient network-class errors that may be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::RateLimited { .. })
    }
}

/// Port for broker order operations.
#[async_trait]
pub trait BrokerOrderGateway: Send + Sync {
    /// Place an order; returns the broker's order id on acceptance.
    ///
    /// # Errors
    ///
    /// Returns a taxonomy error; transient failures are retried internally
    /// with bounded backoff before `Connection` is surfaced.
    async fn place(&self, order: &BrokerOrder) -> Result<BrokerOrderId, GatewayError>;

    /// Cancel an order.
    ///
    /// # Errors
    ///
    /// Returns a taxonomy error on failure.
    async fn cancel(
        &self,
        user_id: &UserId,
        account_id: &AccountId,
        broker_order_id: &BrokerOrderId,
    ) -> Result<(), GatewayError>;

    /// Replace an order with new terms; returns the replacement order id.
    ///
    /// # Errors
    ///
    /// Returns a taxonomy error on failure.
    async fn replace(
        &self,
        user_id: &UserId,
        account_id: &AccountId,
        broker_order_id: &BrokerOrderId,
        terms: &ReplaceTerms,
    ) -> Result<BrokerOrderId, GatewayError>;

    /// Fetch execution reports for an order, in broker-reported sequence.
    ///
    /// # Errors
    ///
    /// Returns a taxonomy error on failure.
    async fn get_executions(
        &self,
        user_id: &UserId,
        account_id: &AccountId,
        broker_order_id: &BrokerOrderId,
    ) -> Result<Vec<FillEvent>, GatewayError>;
}
