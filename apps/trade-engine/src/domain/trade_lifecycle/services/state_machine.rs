//! Trade state machine service.
//!
//! Validates lifecycle transitions; terminal states admit none.

use crate::domain::trade_lifecycle::errors::TradeError;
use crate::domain::trade_lifecycle::value_objects::TradeStatus;

/// Trade state machine for validating transitions.
pub struct TradeStateMachine;

impl TradeStateMachine {
    /// Check if a state transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: TradeStatus, to: TradeStatus) -> bool {
        matches!(
            (from, to),
            // From Pending
            (TradeStatus::Pending, TradeStatus::Submitted)
                | (TradeStatus::Pending, TradeStatus::Cancelled)
                | (TradeStatus::Pending, TradeStatus::Failed)
                // From Submitted
                | (TradeStatus::Submitted, TradeStatus::PartiallyFilled)
                | (TradeStatus::Submitted, TradeStatus::Executed)
                | (TradeStatus::Submitted, TradeStatus::Cancelled)
                | (TradeStatus::Submitted, TradeStatus::Failed)
                // From PartiallyFilled (further fills keep the status)
                | (TradeStatus::PartiallyFilled, TradeStatus::PartiallyFilled)
                | (TradeStatus::PartiallyFilled, TradeStatus::Executed)
                | (TradeStatus::PartiallyFilled, TradeStatus::Cancelled)
                // From Executed
                | (TradeStatus::Executed, TradeStatus::Closed)
        )
    }

    /// Validate a state transition.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is invalid.
    pub fn validate_transition(from: TradeStatus, to: TradeStatus) -> Result<(), TradeError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(TradeError::InvalidStateTransition {
                from,
                to,
                reason: Self::transition_error_reason(from, to),
            })
        }
    }

    /// Get a human-readable reason for an invalid transition.
    #[must_use]
    pub fn transition_error_reason(from: TradeStatus, to: TradeStatus) -> String {
        match from {
            TradeStatus::Closed => format!("Trade is closed, cannot transition to {to}"),
            TradeStatus::Cancelled => format!("Trade is cancelled, cannot transition to {to}"),
            TradeStatus::Failed => format!("Trade has failed, cannot transition to {to}"),
            _ => format!("Invalid transition from {from} to {to}"),
        }
    }

    /// Get all valid next states from a given state.
    #[must_use]
    pub fn valid_next_states(from: TradeStatus) -> Vec<TradeStatus> {
        match from {
            TradeStatus::Pending => vec![
                TradeStatus::Submitted,
                TradeStatus::Cancelled,
                TradeStatus::Failed,
            ],
            TradeStatus::Submitted => vec![
                TradeStatus::PartiallyFilled,
                TradeStatus::Executed,
                TradeStatus::Cancelled,
                TradeStatus::Failed,
            ],
            TradeStatus::PartiallyFilled => vec![
                TradeStatus::PartiallyFilled,
                TradeStatus::Executed,
                TradeStatus::Cancelled,
            ],
            TradeStatus::Executed => vec![TradeStatus::Closed],
            // Terminal states
            TradeStatus::Closed | TradeStatus::Cancelled | TradeStatus::Failed => vec![],
        }
    }
}
