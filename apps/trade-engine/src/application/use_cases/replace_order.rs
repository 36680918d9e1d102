//! Replace order use case.
//!
//! Re-prices an unfilled submitted order through the broker's replace
//! endpoint. The replacement keeps the trade's identity; only the broker
//! order id and pricing change.

use std::sync::Arc;

use tracing::info;

use crate::application::locks::TradeLockRegistry;
use crate::application::ports::{BrokerOrderGateway, ReplaceTerms};
use crate::domain::shared::TradeId;
use crate::domain::trade_lifecycle::aggregate::Trade;
use crate::domain::trade_lifecycle::errors::TradeError;
use crate::domain::trade_lifecycle::repository::TradeRepository;
use crate::domain::trade_lifecycle::value_objects::TradeStatus;
use crate::error::EngineError;

/// Use case for replacing an order's terms.
pub struct ReplaceOrderUseCase {
    repository: Arc<dyn TradeRepository>,
    gateway: Arc<dyn BrokerOrderGateway>,
    locks: Arc<TradeLockRegistry>,
}

impl ReplaceOrderUseCase {
    /// Create a new replace use case.
    pub fn new(
        repository: Arc<dyn TradeRepository>,
        gateway: Arc<dyn BrokerOrderGateway>,
        locks: Arc<TradeLockRegistry>,
    ) -> Self {
        Self {
            repository,
            gateway,
            locks,
        }
    }

    /// Replace an order with new terms.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown trade, an invalid-transition error
    /// when the trade is not an unfilled submitted order, or a gateway
    /// error when the broker replace fails.
    pub async fn execute(
        &self,
        trade_id: &TradeId,
        terms: ReplaceTerms,
    ) -> Result<Trade, EngineError> {
        let _guard = self.locks.acquire(trade_id).await;

        let mut trade = self
            .repository
            .find_by_id(trade_id)
            .await?
            .ok_or_else(|| TradeError::NotFound {
                trade_id: trade_id.as_str().to_string(),
            })?;

        if trade.status() != TradeStatus::Submitted || trade.filled_quantity().is_positive() {
            return Err(EngineError::Trade(TradeError::InvalidStateTransition {
                from: trade.status(),
                to: TradeStatus::Submitted,
                reason: "only an unfilled submitted order can be replaced".to_string(),
            }));
        }

        let broker_order_id =
            trade
                .broker_order_id()
                .cloned()
                .ok_or_else(|| TradeError::InvariantViolation {
                    invariant: "submitted trade holds a broker order id".to_string(),
                    state: format!("trade {trade_id} has none"),
                })?;

        terms.pricing.validate().map_err(EngineError::Trade)?;

        let new_broker_order_id = self
            .gateway
            .replace(trade.user_id(), trade.account_id(), &broker_order_id, &terms)
            .await
            .map_err(EngineError::Gateway)?;

        trade
            .reprice(terms.pricing, new_broker_order_id)
            .map_err(EngineError::Trade)?;
        self.repository.save(&mut trade).await?;

        info!(
            trade_id = %trade.id(),
            broker_order_id = ?trade.broker_order_id(),
            "Order replaced with new terms"
        );

        Ok(trade)
    }
}
