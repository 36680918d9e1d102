//! In-memory trade store.
//!
//! Reference implementation of the repository port with the same
//! optimistic-versioning contract a durable adapter must honor. Suitable
//! for testing and development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::shared::{BrokerOrderId, Symbol, Timestamp, TradeId, UserId};
use crate::domain::stop_enforcement::StopLossStatus;
use crate::domain::trade_lifecycle::aggregate::Trade;
use crate::domain::trade_lifecycle::errors::TradeError;
use crate::domain::trade_lifecycle::repository::TradeRepository;
use crate::domain::trade_lifecycle::value_objects::TradeStatus;

/// In-memory implementation of `TradeRepository`.
#[derive(Debug, Default)]
pub struct InMemoryTradeStore {
    trades: RwLock<HashMap<String, Trade>>,
}

impl InMemoryTradeStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trades: RwLock::new(HashMap::new()),
        }
    }

    /// Number of trades in the store.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trades.read().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// True when the store holds no trades.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TradeRepository for InMemoryTradeStore {
    async fn save(&self, trade: &mut Trade) -> Result<(), TradeError> {
        let mut trades = self
            .trades
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(stored) = trades.get(trade.id().as_str()) {
            if stored.version() != trade.version() {
                return Err(TradeError::VersionConflict {
                    trade_id: trade.id().as_str().to_string(),
                    expected: trade.version(),
                    actual: stored.version(),
                });
            }
        }

        trade.set_version(trade.version() + 1);
        trades.insert(trade.id().as_str().to_string(), trade.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &TradeId) -> Result<Option<Trade>, TradeError> {
        let trades = self
            .trades
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(trades.get(id.as_str()).cloned())
    }

    async fn find_by_broker_order_id(
        &self,
        broker_order_id: &BrokerOrderId,
    ) -> Result<Option<Trade>, TradeError> {
        let trades = self
            .trades
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(trades
            .values()
            .find(|t| t.broker_order_id() == Some(broker_order_id))
            .cloned())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Trade>, TradeError> {
        let trades = self
            .trades
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(trades
            .values()
            .filter(|t| t.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_status(&self, status: TradeStatus) -> Result<Vec<Trade>, TradeError> {
        let trades = self
            .trades
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(trades
            .values()
            .filter(|t| t.status() == status)
            .cloned()
            .collect())
    }

    async fn find_open_protected(&self) -> Result<Vec<Trade>, TradeError> {
        let trades = self
            .trades
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(trades
            .values()
            .filter(|t| t.has_armed_stop())
            .cloned()
            .collect())
    }

    async fn find_pending_force_close(&self) -> Result<Vec<Trade>, TradeError> {
        let trades = self
            .trades
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(trades
            .values()
            .filter(|t| {
                t.status().is_open_position()
                    && t.stop_loss_order()
                        .is_some_and(|s| s.status() == StopLossStatus::Triggered && !s.is_escalated())
            })
            .cloned()
            .collect())
    }

    async fn count_submitted_since(
        &self,
        user_id: &UserId,
        cutoff: Timestamp,
    ) -> Result<u32, TradeError> {
        let trades = self
            .trades
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let count = trades
            .values()
            .filter(|t| t.user_id() == user_id)
            .filter(|t| t.submitted_at().is_some_and(|at| at >= cutoff))
            .count();
        u32::try_from(count).map_err(|_| TradeError::Storage {
            message: "trade count overflow".to_string(),
        })
    }

    async fn open_exposure(
        &self,
        user_id: &UserId,
        symbol: &Symbol,
    ) -> Result<Decimal, TradeError> {
        let trades = self
            .trades
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(trades
            .values()
            .filter(|t| t.user_id() == user_id && t.symbol() == symbol)
            .filter(|t| t.status().is_open_position())
            .map(|t| t.fills().filled_notional().amount())
            .sum())
    }
}
