//! Fill tracking with quantity-conservation semantics.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{DomainError, ExecutionId, Money, Quantity, Timestamp};

use super::FillEvent;

/// Outcome of applying a fill event to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// The fill was applied and the ledger updated.
    Applied,
    /// The execution id was seen before; the event was ignored.
    Duplicate,
}

/// Canonical fill state for one trade.
///
/// Maintains the conservation rule `requested = filled + remaining` and the
/// quantity-weighted average fill price across all applied executions.
/// Events apply strictly in broker-reported sequence; an already-seen
/// execution id is idempotently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillLedger {
    requested: Quantity,
    filled: Quantity,
    remaining: Quantity,
    average_price: Money,
    total_fees: Money,
    fills: Vec<FillEvent>,
    applied_executions: HashSet<ExecutionId>,
    last_sequence: Option<u64>,
    last_fill_at: Option<Timestamp>,
}

impl FillLedger {
    /// Create an empty ledger for a requested quantity.
    #[must_use]
    pub fn new(requested: Quantity) -> Self {
        Self {
            requested,
            filled: Quantity::ZERO,
            remaining: requested,
            average_price: Money::ZERO,
            total_fees: Money::ZERO,
            fills: Vec::new(),
            applied_executions: HashSet::new(),
            last_sequence: None,
            last_fill_at: None,
        }
    }

    /// Original requested quantity.
    #[must_use]
    pub const fn requested(&self) -> Quantity {
        self.requested
    }

    /// Cumulative filled quantity.
    #[must_use]
    pub const fn filled(&self) -> Quantity {
        self.filled
    }

    /// Remaining unfilled quantity.
    #[must_use]
    pub const fn remaining(&self) -> Quantity {
        self.remaining
    }

    /// Quantity-weighted average fill price.
    #[must_use]
    pub const fn average_price(&self) -> Money {
        self.average_price
    }

    /// Accumulated fees across all fills.
    #[must_use]
    pub const fn total_fees(&self) -> Money {
        self.total_fees
    }

    /// Applied fill events, in application order.
    #[must_use]
    pub fn fills(&self) -> &[FillEvent] {
        &self.fills
    }

    /// Timestamp of the most recent fill.
    #[must_use]
    pub const fn last_fill_at(&self) -> Option<Timestamp> {
        self.last_fill_at
    }

    /// Apply a broker execution to this ledger.
    ///
    /// New average = `(filled * avg + qty * price) / (filled + qty)`;
    /// `remaining -= qty`.
    ///
    /// # Errors
    ///
    /// Returns an invariant violation if the event arrives out of
    /// broker-reported sequence or its quantity exceeds the remaining
    /// quantity. Both are fatal for the trade: financial state is never
    /// auto-corrected.
    pub fn apply(&mut self, event: FillEvent) -> Result<FillOutcome, DomainError> {
        if self.applied_executions.contains(&event.execution_id) {
            return Ok(FillOutcome::Duplicate);
        }

        if let Some(last) = self.last_sequence {
            if event.sequence <= last {
                return Err(DomainError::InvariantViolation {
                    aggregate: "FillLedger".to_string(),
                    invariant: "fills apply in broker-reported sequence".to_string(),
                    state: format!("sequence={}, last_applied={last}", event.sequence),
                });
            }
        }

        if event.quantity > self.remaining {
            return Err(DomainError::InvariantViolation {
                aggregate: "FillLedger".to_string(),
                invariant: "fill quantity <= remaining quantity".to_string(),
                state: format!(
                    "fill_quantity={}, remaining={}",
                    event.quantity.amount(),
                    self.remaining.amount()
                ),
            });
        }

        let new_filled = self.filled + event.quantity;
        if new_filled.amount() > Decimal::ZERO {
            let old_value = self.average_price.amount() * self.filled.amount();
            let fill_value = event.price.amount() * event.quantity.amount();
            self.average_price = Money::new((old_value + fill_value) / new_filled.amount());
        }

        self.filled = new_filled;
        self.remaining = Quantity::new(self.requested.amount() - self.filled.amount());
        if let Some(fee) = event.fee {
            self.total_fees = self.total_fees + fee;
        }
        self.last_sequence = Some(event.sequence);
        self.last_fill_at = Some(event.timestamp);
        self.applied_executions.insert(event.execution_id.clone());
        self.fills.push(event);

        debug_assert!(self.verify_conservation());

        Ok(FillOutcome::Applied)
    }

    /// True once the full requested quantity has filled.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.remaining.amount() <= Decimal::ZERO
    }

    /// True when some but not all of the requested quantity has filled.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.filled.amount() > Decimal::ZERO && self.remaining.amount() > Decimal::ZERO
    }

    /// Verify `requested = filled + remaining`.
    #[must_use]
    pub fn verify_conservation(&self) -> bool {
        self.requested.amount() == self.filled.amount() + self.remaining.amount()
    }

    /// Total notional value filled so far.
    #[must_use]
    pub fn filled_notional(&self) -> Money {
        self.average_price.notional(self.filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fill(execution_id: &str, sequence: u64, qty: i64, price: f64) -> FillEvent {
        FillEvent::new(
            execution_id,
            sequence,
            Quantity::from_i64(qty),
            Money::usd(price),
            Timestamp::now(),
        )
    }

    #[test]
    fn ledger_new_is_empty() {
        let ledger = FillLedger::new(Quantity::from_i64(100));
        assert_eq!(ledger.filled(), Quantity::ZERO);
        assert_eq!(ledger.remaining(), Quantity::from_i64(100));
        assert_eq!(ledger.average_price(), Money::ZERO);
        assert!(ledger.verify_conservation());
    }

    #[test]
    fn conservation_maintained_through_fills() {
        let mut ledger = FillLedger::new(Quantity::from_i64(100));

        ledger.apply(make_fill("e1", 1, 30, 150.00)).unwrap();
        assert_eq!(ledger.filled(), Quantity::from_i64(30));
        assert_eq!(ledger.remaining(), Quantity::from_i64(70));
        assert!(ledger.verify_conservation());

        ledger.apply(make_fill("e2", 2, 50, 151.00)).unwrap();
        assert_eq!(ledger.filled(), Quantity::from_i64(80));
        assert_eq!(ledger.remaining(), Quantity::from_i64(20));
        assert!(ledger.verify_conservation());

        ledger.apply(make_fill("e3", 3, 20, 150.50)).unwrap();
        assert_eq!(ledger.filled(), Quantity::from_i64(100));
        assert_eq!(ledger.remaining(), Quantity::ZERO);
        assert!(ledger.is_filled());
        assert!(ledger.verify_conservation());
    }

    #[test]
    fn weighted_average_price() {
        let mut ledger = FillLedger::new(Quantity::from_i64(100));

        // 60 @ $10.00, then 40 @ $10.50 -> average $10.20
        ledger.apply(make_fill("e1", 1, 60, 10.00)).unwrap();
        assert_eq!(ledger.average_price(), Money::usd(10.00));

        ledger.apply(make_fill("e2", 2, 40, 10.50)).unwrap();
        assert_eq!(ledger.average_price(), Money::usd(10.20));
        assert!(ledger.is_filled());
    }

    #[test]
    fn duplicate_execution_id_is_ignored() {
        let mut ledger = FillLedger::new(Quantity::from_i64(100));

        let outcome = ledger.apply(make_fill("e1", 1, 60, 10.00)).unwrap();
        assert_eq!(outcome, FillOutcome::Applied);

        // Same execution id reported again: no change.
        let outcome = ledger.apply(make_fill("e1", 2, 60, 10.00)).unwrap();
        assert_eq!(outcome, FillOutcome::Duplicate);
        assert_eq!(ledger.filled(), Quantity::from_i64(60));
        assert_eq!(ledger.fills().len(), 1);
    }

    #[test]
    fn out_of_order_sequence_is_invariant_violation() {
        let mut ledger = FillLedger::new(Quantity::from_i64(100));

        ledger.apply(make_fill("e2", 2, 40, 10.00)).unwrap();

        let result = ledger.apply(make_fill("e1", 1, 30, 10.00));
        assert!(matches!(
            result,
            Err(DomainError::InvariantViolation { .. })
        ));
        // Ledger unchanged by the rejected event.
        assert_eq!(ledger.filled(), Quantity::from_i64(40));
    }

    #[test]
    fn fill_exceeding_remaining_is_invariant_violation() {
        let mut ledger = FillLedger::new(Quantity::from_i64(100));

        let result = ledger.apply(make_fill("e1", 1, 150, 10.00));
        assert!(matches!(
            result,
            Err(DomainError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn is_partial_between_first_and_last_fill() {
        let mut ledger = FillLedger::new(Quantity::from_i64(100));
        assert!(!ledger.is_partial());

        ledger.apply(make_fill("e1", 1, 50, 10.00)).unwrap();
        assert!(ledger.is_partial());
        assert!(!ledger.is_filled());

        ledger.apply(make_fill("e2", 2, 50, 10.00)).unwrap();
        assert!(!ledger.is_partial());
        assert!(ledger.is_filled());
    }

    #[test]
    fn fees_accumulate() {
        let mut ledger = FillLedger::new(Quantity::from_i64(100));

        ledger
            .apply(make_fill("e1", 1, 50, 10.00).with_fee(Money::usd(0.50)))
            .unwrap();
        ledger
            .apply(make_fill("e2", 2, 50, 10.00).with_fee(Money::usd(0.75)))
            .unwrap();

        assert_eq!(ledger.total_fees(), Money::usd(1.25));
    }

    #[test]
    fn filled_notional() {
        let mut ledger = FillLedger::new(Quantity::from_i64(100));
        ledger.apply(make_fill("e1", 1, 100, 10.20)).unwrap();
        assert_eq!(ledger.filled_notional(), Money::usd(1020.0));
    }

    #[test]
    fn ledger_serde_roundtrip() {
        let mut ledger = FillLedger::new(Quantity::from_i64(100));
        ledger.apply(make_fill("e1", 1, 60, 10.00)).unwrap();

        let json = serde_json::to_string(&ledger).unwrap();
        let parsed: FillLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ledger);
    }
}
