//! Fill synchronization use case.
//!
//! Pulls execution reports from the broker and applies them to the trade
//! in broker-reported order. Previously-seen execution ids are idempotently
//! ignored; an out-of-order report halts the trade for manual review.

use std::sync::Arc;

use tracing::{error, info};

use crate::application::locks::TradeLockRegistry;
use crate::application::ports::BrokerOrderGateway;
use crate::domain::shared::TradeId;
use crate::domain::trade_lifecycle::aggregate::Trade;
use crate::domain::trade_lifecycle::errors::TradeError;
use crate::domain::trade_lifecycle::repository::TradeRepository;
use crate::domain::trade_lifecycle::value_objects::FillOutcome;
use crate::error::EngineError;

/// Use case for syncing broker executions into trade state.
pub struct SyncFillsUseCase {
    repository: Arc<dyn TradeRepository>,
    gateway: Arc<dyn BrokerOrderGateway>,
    locks: Arc<TradeLockRegistry>,
}

impl SyncFillsUseCase {
    /// Create a new fill-sync use case.
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

    /// Pull and apply executions for a trade.
    ///
    /// Trades that cannot receive fills (terminal, executed, or never
    /// submitted) are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown trade, a gateway error when the
    /// executions cannot be fetched, or the invariant violation that halted
    /// the trade.
    pub async fn execute(&self, trade_id: &TradeId) -> Result<Trade, EngineError> {
        let _guard = self.locks.acquire(trade_id).await;

        let mut trade = self
            .repository
            .find_by_id(trade_id)
            .await?
            .ok_or_else(|| TradeError::NotFound {
                trade_id: trade_id.as_str().to_string(),
            })?;

        let Some(broker_order_id) = trade.broker_order_id().cloned() else {
            return Ok(trade);
        };
        if !trade.status().can_fill() {
            return Ok(trade);
        }

        let executions = self
            .gateway
            .get_executions(trade.user_id(), trade.account_id(), &broker_order_id)
            .await
            .map_err(EngineError::Gateway)?;

        let mut applied = 0usize;
        for event in executions {
            match trade.apply_execution(event) {
                Ok(FillOutcome::Applied) => applied += 1,
                Ok(FillOutcome::Duplicate) => {}
                Err(err) => {
                    // Fatal for this trade: persist the halted state and
                    // surface for manual review.
                    error!(
                        trade_id = %trade.id(),
                        error = %err,
                        "Fill invariant violation; trade halted for manual review"
                    );
                    self.repository.save(&mut trade).await?;
                    return Err(EngineError::Trade(err));
                }
            }
        }

        if applied > 0 {
            info!(
                trade_id = %trade.id(),
                applied,
                filled = %trade.filled_quantity(),
                remaining = %trade.remaining_quantity(),
                average_price = %trade.average_fill_price(),
                status = %trade.status(),
                "Applied broker executions"
            );
        }

        self.repository.save(&mut trade).await?;
        Ok(trade)
    }
}
