//! Stop-loss order linked to one trade.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::{DomainError, Money, StopOrderId, Timestamp, TradeId};

/// Status of a protective stop-loss order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopLossStatus {
    /// Watching for a breach.
    Armed,
    /// Breach observed; forced liquidation issued or in progress.
    Triggered,
    /// Parent position closed via another path.
    Cancelled,
}

impl fmt::Display for StopLossStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Armed => write!(f, "armed"),
            Self::Triggered => write!(f, "triggered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Protective stop-loss order for one trade.
///
/// Transitions to `Triggered` exactly once per arming; a second trigger is
/// an invariant violation. Tracks force-close attempts so a repeatedly
/// failing liquidation escalates to an operator instead of retrying
/// forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopLossOrder {
    id: StopOrderId,
    trade_id: TradeId,
    stop_price: Money,
    status: StopLossStatus,
    triggered_at: Option<Timestamp>,
    close_attempts: u32,
    escalated: bool,
    created_at: Timestamp,
}

impl StopLossOrder {
    /// Arm a new stop-loss order for a trade.
    #[must_use]
    pub fn arm(trade_id: TradeId, stop_price: Money) -> Self {
        Self {
            id: StopOrderId::generate(),
            trade_id,
            stop_price,
            status: StopLossStatus::Armed,
            triggered_at: None,
            close_attempts: 0,
            escalated: false,
            created_at: Timestamp::now(),
        }
    }

    /// Get the stop order ID.
    #[must_use]
    pub const fn id(&self) -> &StopOrderId {
        &self.id
    }

    /// Get the parent trade ID.
    #[must_use]
    pub const fn trade_id(&self) -> &TradeId {
        &self.trade_id
    }

    /// Get the exit price.
    #[must_use]
    pub const fn stop_price(&self) -> Money {
        self.stop_price
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> StopLossStatus {
        self.status
    }

    /// When the stop triggered, if it has.
    #[must_use]
    pub const fn triggered_at(&self) -> Option<Timestamp> {
        self.triggered_at
    }

    /// Number of failed force-close attempts since triggering.
    #[must_use]
    pub const fn close_attempts(&self) -> u32 {
        self.close_attempts
    }

    /// True once the force-close has been escalated to an operator.
    #[must_use]
    pub const fn is_escalated(&self) -> bool {
        self.escalated
    }

    /// True while the stop is watching for a breach.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.status == StopLossStatus::Armed
    }

    /// Transition to `Triggered`.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the stop is not armed; a stop
    /// triggers at most once per arming.
    pub fn trigger(&mut self) -> Result<(), DomainError> {
        if self.status != StopLossStatus::Armed {
            return Err(DomainError::InvariantViolation {
                aggregate: "StopLossOrder".to_string(),
                invariant: "stop-loss triggers exactly once per arming".to_string(),
                state: format!("status={}", self.status),
            });
        }
        self.status = StopLossStatus::Triggered;
        self.triggered_at = Some(Timestamp::now());
        Ok(())
    }

    /// Cancel the stop because the parent position closed via another path.
    ///
    /// Cancelling an already-cancelled stop is a no-op; a triggered stop
    /// stays triggered.
    pub fn cancel(&mut self) {
        if self.status == StopLossStatus::Armed {
            self.status = StopLossStatus::Cancelled;
        }
    }

    /// Record a failed force-close attempt.
    ///
    /// Returns true when the attempt count reaches `ceiling` and the stop
    /// escalates to an operator (no further automatic retries).
    pub fn record_close_failure(&mut self, ceiling: u32) -> bool {
        self.close_attempts += 1;
        if self.close_attempts >= ceiling {
            self.escalated = true;
        }
        self.escalated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed_stop() -> StopLossOrder {
        StopLossOrder::arm(TradeId::new("trd-1"), Money::usd(9.50))
    }

    #[test]
    fn arm_creates_armed_stop() {
        let stop = armed_stop();
        assert!(stop.is_armed());
        assert_eq!(stop.stop_price(), Money::usd(9.50));
        assert_eq!(stop.close_attempts(), 0);
        assert!(!stop.is_escalated());
    }

    #[test]
    fn trigger_succeeds_once() {
        let mut stop = armed_stop();
        stop.trigger().unwrap();
        assert_eq!(stop.status(), StopLossStatus::Triggered);
        assert!(stop.triggered_at().is_some());
    }

    #[test]
    fn second_trigger_is_invariant_violation() {
        let mut stop = armed_stop();
        stop.trigger().unwrap();

        let result = stop.trigger();
        assert!(matches!(
            result,
            Err(DomainError::InvariantViolation { .. })
        ));
        assert_eq!(stop.status(), StopLossStatus::Triggered);
    }

    #[test]
    fn trigger_after_cancel_is_invariant_violation() {
        let mut stop = armed_stop();
        stop.cancel();
        assert!(stop.trigger().is_err());
    }

    #[test]
    fn cancel_only_affects_armed_stop() {
        let mut stop = armed_stop();
        stop.trigger().unwrap();

        // Triggered stays triggered.
        stop.cancel();
        assert_eq!(stop.status(), StopLossStatus::Triggered);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut stop = armed_stop();
        stop.cancel();
        stop.cancel();
        assert_eq!(stop.status(), StopLossStatus::Cancelled);
    }

    #[test]
    fn close_failures_escalate_at_ceiling() {
        let mut stop = armed_stop();
        stop.trigger().unwrap();

        assert!(!stop.record_close_failure(3));
        assert!(!stop.record_close_failure(3));
        assert!(stop.record_close_failure(3));
        assert!(stop.is_escalated());
        assert_eq!(stop.close_attempts(), 3);
    }

    #[test]
    fn stop_serde_roundtrip() {
        let stop = armed_stop();
        let json = serde_json::to_string(&stop).unwrap();
        let parsed: StopLossOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, stop);
    }
}
