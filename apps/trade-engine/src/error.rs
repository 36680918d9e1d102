//! Engine-level error taxonomy.
//!
//! One surface for every failure class: validation and risk errors reach
//! the caller with a structured reason, transient broker errors are
//! retried below this layer and arrive here only after exhaustion, and
//! invariant violations mark the affected trade for manual review.

use thiserror::Error;

use crate::application::ports::{
    CredentialError, GatewayError, MarketDataError, RiskDataError,
};
use crate::domain::risk_management::RiskDenial;
use crate::domain::trade_lifecycle::errors::TradeError;

/// Errors surfaced by the trade engine's exposed operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The risk gate denied the order; no broker call was made.
    #[error("Order denied by risk gate: {denial}")]
    RiskDenied {
        /// The specific limit breached.
        denial: RiskDenial,
    },

    /// Trade lifecycle error (validation, state machine, invariants,
    /// storage).
    #[error(transparent)]
    Trade(#[from] TradeError),

    /// Broker gateway error after adapter-level retry handling.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Market data error.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Credential error.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Risk configuration/portfolio read error.
    #[error(transparent)]
    RiskData(#[from] RiskDataError),
}

impl EngineError {
    /// True when the error is a structured risk denial.
    #[must_use]
    pub const fn is_risk_denial(&self) -> bool {
        matches!(self, Self::RiskDenied { .. })
    }

    /// The risk denial, when present.
    #[must_use]
    pub const fn denial(&self) -> Option<&RiskDenial> {
        match self {
            Self::RiskDenied { denial } => Some(denial),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_denied_display_carries_reason() {
        let err = EngineError::RiskDenied {
            denial: RiskDenial::MarketClosed,
        };
        assert!(format!("{err}").contains("market is closed"));
        assert!(err.is_risk_denial());
        assert_eq!(err.denial(), Some(&RiskDenial::MarketClosed));
    }

    #[test]
    fn gateway_error_is_transparent() {
        let err = EngineError::from(GatewayError::InsufficientFunds);
        assert_eq!(format!("{err}"), "Insufficient funds");
        assert!(!err.is_risk_denial());
    }

    #[test]
    fn trade_error_is_transparent() {
        let err = EngineError::from(TradeError::NotFound {
            trade_id: "trd-1".to_string(),
        });
        assert!(format!("{err}").contains("trd-1"));
    }
}
