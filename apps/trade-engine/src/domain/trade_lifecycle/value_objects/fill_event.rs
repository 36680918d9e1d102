//! Fill event reported by the broker.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{ExecutionId, Money, Quantity, Timestamp};

/// A single broker-reported execution against one order.
///
/// Carries the broker's execution id (for dedup) and sequence number
/// (fills must apply in broker-reported order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEvent {
    /// Broker's unique id for this execution.
    pub execution_id: ExecutionId,
    /// Broker-reported sequence of this execution within the order.
    pub sequence: u64,
    /// Quantity filled in this execution.
    pub quantity: Quantity,
    /// Price at which this fill occurred.
    pub price: Money,
    /// Fee charged for this fill, if reported.
    pub fee: Option<Money>,
    /// Timestamp of the fill.
    pub timestamp: Timestamp,
}

impl FillEvent {
    /// Create a new fill event.
    #[must_use]
    pub fn new(
        execution_id: impl Into<ExecutionId>,
        sequence: u64,
        quantity: Quantity,
        price: Money,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            sequence,
            quantity,
            price,
            fee: None,
            timestamp,
        }
    }

    /// Attach a fee to the fill.
    #[must_use]
    pub const fn with_fee(mut self, fee: Money) -> Self {
        self.fee = Some(fee);
        self
    }

    /// Notional value of this fill.
    #[must_use]
    pub fn notional(&self) -> Money {
        self.price.notional(self.quantity)
    }
}
