//! Trade lifecycle errors.

use std::fmt;

use super::value_objects::TradeStatus;

/// Errors that can occur in the trade lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    /// Invalid state transition attempted.
    InvalidStateTransition {
        /// Current trade status.
        from: TradeStatus,
        /// Attempted status.
        to: TradeStatus,
        /// Reason for failure.
        reason: String,
    },

    /// Trade cannot receive fills in its current state.
    CannotFill {
        /// Current status.
        status: TradeStatus,
    },

    /// Invalid order parameters.
    InvalidParameters {
        /// Field with invalid value.
        field: String,
        /// Error message.
        message: String,
    },

    /// Financial invariant violated; the trade is halted for manual review.
    InvariantViolation {
        /// Invariant description.
        invariant: String,
        /// Current state values.
        state: String,
    },

    /// Trade not found.
    NotFound {
        /// Trade ID.
        trade_id: String,
    },

    /// Concurrent modification detected by the optimistic version check.
    VersionConflict {
        /// Trade ID.
        trade_id: String,
        /// Version the caller held.
        expected: u64,
        /// Version found in storage.
        actual: u64,
    },

    /// Persistence failure.
    Storage {
        /// Error details.
        message: String,
    },
}

impl fmt::Display for TradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStateTransition { from, to, reason } => {
                write!(f, "Invalid trade state transition: {from} -> {to}: {reason}")
            }
            Self::CannotFill { status } => {
                write!(f, "Cannot apply fill to trade in status: {status}")
            }
            Self::InvalidParameters { field, message } => {
                write!(f, "Invalid order parameter '{field}': {message}")
            }
            Self::InvariantViolation { invariant, state } => {
                write!(f, "Trade invariant violation: {invariant} (state: {state})")
            }
            Self::NotFound { trade_id } => {
                write!(f, "Trade not found: {trade_id}")
            }
            Self::VersionConflict {
                trade_id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Concurrent modification of trade {trade_id}: expected version {expected}, found {actual}"
                )
            }
            Self::Storage { message } => {
                write!(f, "Trade storage error: {message}")
            }
        }
    }
}

impl std::error::Error for TradeError {}
