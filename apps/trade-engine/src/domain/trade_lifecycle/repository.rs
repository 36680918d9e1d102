//! Trade repository trait.
//!
//! Defines the persistence abstraction for trades. Implemented by adapters
//! in the infrastructure layer against transactional durable storage with
//! optimistic versioning.

use async_trait::async_trait;

use super::aggregate::Trade;
use super::errors::TradeError;
use super::value_objects::TradeStatus;
use crate::domain::shared::{BrokerOrderId, Symbol, Timestamp, TradeId, UserId};

/// Repository trait for Trade persistence.
///
/// `save` performs an optimistic version check: writing a trade whose
/// version does not match the stored row fails with
/// [`TradeError::VersionConflict`] so concurrent writers cannot clobber each
/// other's updates.
#[async_trait]
pub trait TradeRepository: Send + Sync {
    /// Save a trade (insert or update), bumping its version.
    ///
    /// # Errors
    ///
    /// Returns `VersionConflict` on concurrent modification, or a storage
    /// error if persistence fails.
    async fn save(&self, trade: &mut Trade) -> Result<(), TradeError>;

    /// Find a trade by its internal ID.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_id(&self, id: &TradeId) -> Result<Option<Trade>, TradeError>;

    /// Find a trade by the broker's order ID.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_broker_order_id(
        &self,
        broker_order_id: &BrokerOrderId,
    ) -> Result<Option<Trade>, TradeError>;

    /// Find all trades for a user.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Trade>, TradeError>;

    /// Find all trades with a given status.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_status(&self, status: TradeStatus) -> Result<Vec<Trade>, TradeError>;

    /// Find open positions protected by an armed stop-loss.
    ///
    /// These are trades in Executed or PartiallyFilled status with a
    /// non-null stop price and an armed stop order.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_open_protected(&self) -> Result<Vec<Trade>, TradeError>;

    /// Find open positions whose stop has triggered but whose force-close
    /// has not completed, excluding escalated stops.
    ///
    /// The sentinel retries these each cycle until the close succeeds or
    /// the escalation ceiling is reached.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_pending_force_close(&self) -> Result<Vec<Trade>, TradeError>;

    /// Count trades a user submitted at or after `cutoff`.
    ///
    /// Computed against durable rows at call time; this backs the rolling
    /// 24 h trade-count limit and must never come from a cache.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn count_submitted_since(
        &self,
        user_id: &UserId,
        cutoff: Timestamp,
    ) -> Result<u32, TradeError>;

    /// Current exposure (filled notional of open positions) per symbol for
    /// a user, derived on demand from non-terminal trades.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn open_exposure(&self, user_id: &UserId, symbol: &Symbol)
    -> Result<rust_decimal::Decimal, TradeError>;
}
