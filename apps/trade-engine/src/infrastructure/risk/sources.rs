//! In-memory risk config store and ledger-derived portfolio source.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::{PortfolioSource, RiskConfigSource, RiskDataError};
use crate::domain::risk_management::{PortfolioSnapshot, RiskLimitConfig};
use crate::domain::shared::{Money, UserId};
use crate::domain::trade_lifecycle::repository::TradeRepository;

/// In-memory implementation of `RiskConfigSource`.
///
/// Users without an explicit entry get no config, and the gate fails
/// closed for them.
#[derive(Debug, Default)]
pub struct InMemoryRiskConfigStore {
    configs: RwLock<HashMap<String, RiskLimitConfig>>,
}

impl InMemoryRiskConfigStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            configs: RwLock::new(HashMap::new()),
        }
    }

    /// Set a user's limits.
    pub async fn set(&self, user_id: &UserId, config: RiskLimitConfig) {
        let mut configs = self.configs.write().await;
        configs.insert(user_id.as_str().to_string(), config);
    }
}

#[async_trait]
impl RiskConfigSource for InMemoryRiskConfigStore {
    async fn limits_for(&self, user_id: &UserId) -> Result<RiskLimitConfig, RiskDataError> {
        let configs = self.configs.read().await;
        configs
            .get(user_id.as_str())
            .cloned()
            .ok_or_else(|| RiskDataError::NotConfigured {
                user_id: user_id.as_str().to_string(),
            })
    }
}

/// Portfolio source that derives per-symbol exposure from the trade
/// ledger's open positions. Total account value is fed in from the
/// account collaborator.
pub struct LedgerPortfolioSource {
    repository: Arc<dyn TradeRepository>,
    account_values: RwLock<HashMap<String, Money>>,
}

impl LedgerPortfolioSource {
    /// Create a source over the trade repository.
    #[must_use]
    pub fn new(repository: Arc<dyn TradeRepository>) -> Self {
        Self {
            repository,
            account_values: RwLock::new(HashMap::new()),
        }
    }

    /// Record a user's current total account value.
    pub async fn set_account_value(&self, user_id: &UserId, value: Money) {
        let mut values = self.account_values.write().await;
        values.insert(user_id.as_str().to_string(), value);
    }
}

#[async_trait]
impl PortfolioSource for LedgerPortfolioSource {
    async fn snapshot_for(&self, user_id: &UserId) -> Result<PortfolioSnapshot, RiskDataError> {
        let total_value = {
            let values = self.account_values.read().await;
            values
                .get(user_id.as_str())
                .copied()
                .ok_or_else(|| RiskDataError::Unavailable {
                    message: format!("no account value for user {user_id}"),
                })?
        };

        let trades =
            self.repository
                .find_by_user(user_id)
                .await
                .map_err(|e| RiskDataError::Unavailable {
                    message: e.to_string(),
                })?;

        let symbols: HashSet<_> = trades
            .iter()
            .filter(|t| t.status().is_open_position())
            .map(|t| t.symbol().clone())
            .collect();

        let mut snapshot = PortfolioSnapshot::new(total_value);
        for symbol in symbols {
            let exposure = self
                .repository
                .open_exposure(user_id, &symbol)
                .await
                .map_err(|e| RiskDataError::Unavailable {
                    message: e.to_string(),
                })?;
            snapshot = snapshot.with_exposure(symbol, Money::new(exposure));
        }

        Ok(snapshot)
    }
}
