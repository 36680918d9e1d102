//! Domain events emitted by the Trade aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{BrokerOrderId, Money, Quantity, Symbol, Timestamp, TradeId};

/// Trade opened and risk-approved, awaiting broker submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOpened {
    /// Trade identifier.
    pub trade_id: TradeId,
    /// Symbol being traded.
    pub symbol: Symbol,
    /// Requested quantity.
    pub quantity: Quantity,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Order accepted by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSubmitted {
    /// Trade identifier.
    pub trade_id: TradeId,
    /// Broker-assigned order id.
    pub broker_order_id: BrokerOrderId,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// A fill was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFilled {
    /// Trade identifier.
    pub trade_id: TradeId,
    /// Quantity in this fill.
    pub fill_quantity: Quantity,
    /// Price of this fill.
    pub fill_price: Money,
    /// Cumulative filled quantity.
    pub filled_quantity: Quantity,
    /// Remaining unfilled quantity.
    pub remaining_quantity: Quantity,
    /// Weighted average fill price after this fill.
    pub average_fill_price: Money,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// The full requested quantity has filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeExecuted {
    /// Trade identifier.
    pub trade_id: TradeId,
    /// Weighted average fill price.
    pub average_fill_price: Money,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// A stop-loss was armed for the trade's position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopLossArmed {
    /// Trade identifier.
    pub trade_id: TradeId,
    /// Exit price being watched.
    pub stop_price: Money,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// The stop-loss triggered; forced liquidation follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopLossTriggered {
    /// Trade identifier.
    pub trade_id: TradeId,
    /// Price observed at the breach.
    pub breach_price: Money,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// The position was flattened and the trade closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeClosed {
    /// Trade identifier.
    pub trade_id: TradeId,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// The trade was cancelled; any filled remainder is retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeCancelled {
    /// Trade identifier.
    pub trade_id: TradeId,
    /// Quantity filled before cancellation.
    pub filled_quantity: Quantity,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Broker submission failed after retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFailed {
    /// Trade identifier.
    pub trade_id: TradeId,
    /// Last error observed.
    pub error: String,
    /// When the event occurred.
    pub occurred_at: Timestamp,
}

/// Domain events produced by the Trade aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TradeEvent {
    /// Trade opened.
    Opened(TradeOpened),
    /// Trade submitted to the broker.
    Submitted(TradeSubmitted),
    /// Fill applied.
    Filled(TradeFilled),
    /// Fully executed.
    Executed(TradeExecuted),
    /// Stop-loss armed.
    StopArmed(StopLossArmed),
    /// Stop-loss triggered.
    StopTriggered(StopLossTriggered),
    /// Trade closed.
    Closed(TradeClosed),
    /// Trade cancelled.
    Cancelled(TradeCancelled),
    /// Trade failed.
    Failed(TradeFailed),
}
