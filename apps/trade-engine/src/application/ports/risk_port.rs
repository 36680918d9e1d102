//! Risk configuration and portfolio ports (driven).
//!
//! Failures from either port feed the risk gate's fail-closed path: an
//! order is denied, never allowed, when these reads fail.

use async_trait::async_trait;

use crate::domain::risk_management::{PortfolioSnapshot, RiskLimitConfig};
use crate::domain::shared::UserId;

/// Errors reading risk configuration or portfolio state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RiskDataError {
    /// No configuration exists for the user.
    #[error("No risk configuration for user {user_id}")]
    NotConfigured {
        /// Affected user.
        user_id: String,
    },

    /// Storage or collaborator failure.
    #[error("Risk data unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

/// Port for per-user risk limit configuration.
#[async_trait]
pub trait RiskConfigSource: Send + Sync {
    /// Load the user's limits from durable storage at evaluation time.
    ///
    /// # Errors
    ///
    /// Returns error when the configuration cannot be read.
    async fn limits_for(&self, user_id: &UserId) -> Result<RiskLimitConfig, RiskDataError>;
}

/// Port for fresh portfolio snapshots.
#[async_trait]
pub trait PortfolioSource: Send + Sync {
    /// Take a fresh snapshot of the user's portfolio.
    ///
    /// # Errors
    ///
    /// Returns error when a snapshot cannot be taken.
    async fn snapshot_for(&self, user_id: &UserId) -> Result<PortfolioSnapshot, RiskDataError>;
}
