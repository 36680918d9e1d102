//! Cancel order use case.
//!
//! Cancel is terminal-safe: a cancel against an Executed or terminal trade
//! is a no-op that returns the unchanged trade, never an error implying
//! lost fills. Fills that landed before the broker confirmed the cancel are
//! retained in the record.

use std::sync::Arc;

use tracing::info;

use crate::application::locks::TradeLockRegistry;
use crate::application::ports::{BrokerOrderGateway, GatewayError};
use crate::domain::shared::TradeId;
use crate::domain::trade_lifecycle::aggregate::Trade;
use crate::domain::trade_lifecycle::errors::TradeError;
use crate::domain::trade_lifecycle::repository::TradeRepository;
use crate::error::EngineError;

/// Use case for cancelling an order.
pub struct CancelOrderUseCase {
    repository: Arc<dyn TradeRepository>,
    gateway: Arc<dyn BrokerOrderGateway>,
    locks: Arc<TradeLockRegistry>,
}

impl CancelOrderUseCase {
    /// Create a new cancel use case.
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

    /// Cancel a trade.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown trade, or a gateway error when the
    /// broker cancel fails (the trade is left unchanged).
    pub async fn execute(&self, trade_id: &TradeId) -> Result<Trade, EngineError> {
        let _guard = self.locks.acquire(trade_id).await;

        let mut trade = self
            .repository
            .find_by_id(trade_id)
            .await?
            .ok_or_else(|| TradeError::NotFound {
                trade_id: trade_id.as_str().to_string(),
            })?;

        // No-op paths: nothing left to cancel.
        if !trade.status().is_cancelable() {
            info!(
                trade_id = %trade.id(),
                status = %trade.status(),
                "Cancel is a no-op for this trade"
            );
            return Ok(trade);
        }

        if let Some(broker_order_id) = trade.broker_order_id().cloned() {
            match self
                .gateway
                .cancel(trade.user_id(), trade.account_id(), &broker_order_id)
                .await
            {
                // Unknown at the broker: nothing live to cancel, fall
                // through and cancel locally.
                Ok(()) | Err(GatewayError::OrderNotFound { .. }) => {}
                Err(err) => return Err(EngineError::Gateway(err)),
            }

            // Capture fills that landed before the cancel confirmed.
            if let Ok(executions) = self
                .gateway
                .get_executions(trade.user_id(), trade.account_id(), &broker_order_id)
                .await
            {
                for event in executions {
                    if let Err(err) = trade.apply_execution(event) {
                        // Persist the halted state for manual review.
                        self.repository.save(&mut trade).await?;
                        return Err(EngineError::Trade(err));
                    }
                }
            }
        }

        // The cancel may have lost the race to a final fill.
        if trade.status().is_cancelable() {
            trade.cancel().map_err(EngineError::Trade)?;
            info!(
                trade_id = %trade.id(),
                filled = %trade.filled_quantity(),
                "Trade cancelled; filled remainder retained"
            );
        } else {
            info!(
                trade_id = %trade.id(),
                status = %trade.status(),
                "Order filled before cancel completed"
            );
        }

        self.repository.save(&mut trade).await?;
        Ok(trade)
    }
}
