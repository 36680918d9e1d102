//! Trade aggregate root.
//!
//! One user order mapped to at most one broker order. The aggregate owns
//! canonical trade state; all status and quantity mutation flows through it
//! so the lifecycle invariants hold under every path.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{
    AccountId, BrokerOrderId, DomainError, Money, Quantity, Symbol, Timestamp, TradeId, UserId,
};
use crate::domain::stop_enforcement::{StopLossOrder, StopLossStatus};
use crate::domain::trade_lifecycle::errors::TradeError;
use crate::domain::trade_lifecycle::events::{
    StopLossArmed, StopLossTriggered, TradeCancelled, TradeClosed, TradeEvent, TradeExecuted,
    TradeFailed, TradeFilled, TradeOpened, TradeSubmitted,
};
use crate::domain::trade_lifecycle::services::TradeStateMachine;
use crate::domain::trade_lifecycle::value_objects::{
    AssetClass, FillEvent, FillLedger, FillOutcome, OrderPricing, OrderRequest, TradeSide,
    TradeStatus,
};

/// Parameters for reconstituting a Trade from storage.
///
/// Used by repositories to rebuild aggregates from persisted state.
/// No domain events are generated during reconstitution.
#[derive(Debug, Clone)]
pub struct ReconstitutedTradeParams {
    /// Trade identifier.
    pub id: TradeId,
    /// Owning user.
    pub user_id: UserId,
    /// Broker account.
    pub account_id: AccountId,
    /// Symbol being traded.
    pub symbol: Symbol,
    /// Trade direction.
    pub side: TradeSide,
    /// Asset class.
    pub asset_class: AssetClass,
    /// Requested pricing.
    pub pricing: OrderPricing,
    /// Current status.
    pub status: TradeStatus,
    /// Broker-assigned order id.
    pub broker_order_id: Option<BrokerOrderId>,
    /// Fill state.
    pub fills: FillLedger,
    /// Stop-loss exit price.
    pub stop_loss_price: Option<Money>,
    /// Protective stop order.
    pub stop_loss_order: Option<StopLossOrder>,
    /// Take-profit target price.
    pub take_profit_price: Option<Money>,
    /// Take-profit order reference at the broker.
    pub take_profit_order_id: Option<BrokerOrderId>,
    /// Simulation flag.
    pub is_simulation: bool,
    /// Last error observed.
    pub last_error: Option<String>,
    /// Halted-for-review flag.
    pub halted: bool,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Submission timestamp.
    pub submitted_at: Option<Timestamp>,
    /// Full-execution timestamp.
    pub executed_at: Option<Timestamp>,
    /// Close timestamp.
    pub closed_at: Option<Timestamp>,
    /// Last update timestamp.
    pub updated_at: Timestamp,
    /// Optimistic concurrency token.
    pub version: u64,
}

/// Trade aggregate root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    id: TradeId,
    user_id: UserId,
    account_id: AccountId,
    symbol: Symbol,
    side: TradeSide,
    asset_class: AssetClass,
    pricing: OrderPricing,
    status: TradeStatus,
    broker_order_id: Option<BrokerOrderId>,
    fills: FillLedger,
    stop_loss_price: Option<Money>,
    stop_loss_order: Option<StopLossOrder>,
    take_profit_price: Option<Money>,
    take_profit_order_id: Option<BrokerOrderId>,
    is_simulation: bool,
    last_error: Option<String>,
    halted: bool,
    #[serde(skip)]
    events: Vec<TradeEvent>,
    created_at: Timestamp,
    submitted_at: Option<Timestamp>,
    executed_at: Option<Timestamp>,
    closed_at: Option<Timestamp>,
    updated_at: Timestamp,
    version: u64,
}

impl Trade {
    /// Open a new pending trade from a validated order request.
    ///
    /// Generates a `TradeOpened` event.
    ///
    /// # Errors
    ///
    /// Returns error if request validation fails.
    pub fn open(request: OrderRequest) -> Result<Self, TradeError> {
        request.validate()?;

        let id = TradeId::generate();
        let now = Timestamp::now();

        let mut trade = Self {
            id: id.clone(),
            user_id: request.user_id,
            account_id: request.account_id,
            symbol: request.symbol.clone(),
            side: request.side,
            asset_class: request.asset_class,
            pricing: request.pricing,
            status: TradeStatus::Pending,
            broker_order_id: None,
            fills: FillLedger::new(request.quantity),
            stop_loss_price: request.stop_loss_price,
            stop_loss_order: None,
            take_profit_price: request.take_profit_price,
            take_profit_order_id: None,
            is_simulation: request.is_simulation,
            last_error: None,
            halted: false,
            events: Vec::new(),
            created_at: now,
            submitted_at: None,
            executed_at: None,
            closed_at: None,
            updated_at: now,
            version: 0,
        };

        trade.events.push(TradeEvent::Opened(TradeOpened {
            trade_id: id,
            symbol: request.symbol,
            quantity: request.quantity,
            occurred_at: now,
        }));

        Ok(trade)
    }

    /// Reconstitute a trade from stored state (no events generated).
    #[must_use]
    pub fn reconstitute(params: ReconstitutedTradeParams) -> Self {
        Self {
            id: params.id,
            user_id: params.user_id,
            account_id: params.account_id,
            symbol: params.symbol,
            side: params.side,
            asset_class: params.asset_class,
            pricing: params.pricing,
            status: params.status,
            broker_order_id: params.broker_order_id,
            fills: params.fills,
            stop_loss_price: params.stop_loss_price,
            stop_loss_order: params.stop_loss_order,
            take_profit_price: params.take_profit_price,
            take_profit_order_id: params.take_profit_order_id,
            is_simulation: params.is_simulation,
            last_error: params.last_error,
            halted: params.halted,
            events: Vec::new(),
            created_at: params.created_at,
            submitted_at: params.submitted_at,
            executed_at: params.executed_at,
            closed_at: params.closed_at,
            updated_at: params.updated_at,
            version: params.version,
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Get the trade ID.
    #[must_use]
    pub const fn id(&self) -> &TradeId {
        &self.id
    }

    /// Get the owning user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Get the broker account.
    #[must_use]
    pub const fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Get the symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Get the trade side.
    #[must_use]
    pub const fn side(&self) -> TradeSide {
        self.side
    }

    /// Get the asset class.
    #[must_use]
    pub const fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    /// Get the requested pricing.
    #[must_use]
    pub const fn pricing(&self) -> OrderPricing {
        self.pricing
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> TradeStatus {
        self.status
    }

    /// Get the broker order ID.
    #[must_use]
    pub const fn broker_order_id(&self) -> Option<&BrokerOrderId> {
        self.broker_order_id.as_ref()
    }

    /// Get the fill state.
    #[must_use]
    pub const fn fills(&self) -> &FillLedger {
        &self.fills
    }

    /// Requested quantity.
    #[must_use]
    pub const fn requested_quantity(&self) -> Quantity {
        self.fills.requested()
    }

    /// Filled quantity.
    #[must_use]
    pub const fn filled_quantity(&self) -> Quantity {
        self.fills.filled()
    }

    /// Remaining unfilled quantity.
    #[must_use]
    pub const fn remaining_quantity(&self) -> Quantity {
        self.fills.remaining()
    }

    /// Weighted average fill price.
    #[must_use]
    pub const fn average_fill_price(&self) -> Money {
        self.fills.average_price()
    }

    /// Accumulated fees.
    #[must_use]
    pub const fn fees(&self) -> Money {
        self.fills.total_fees()
    }

    /// Get the stop-loss exit price.
    #[must_use]
    pub const fn stop_loss_price(&self) -> Option<Money> {
        self.stop_loss_price
    }

    /// Get the protective stop order.
    #[must_use]
    pub const fn stop_loss_order(&self) -> Option<&StopLossOrder> {
        self.stop_loss_order.as_ref()
    }

    /// Get the take-profit target price.
    #[must_use]
    pub const fn take_profit_price(&self) -> Option<Money> {
        self.take_profit_price
    }

    /// Get the take-profit order reference.
    #[must_use]
    pub const fn take_profit_order_id(&self) -> Option<&BrokerOrderId> {
        self.take_profit_order_id.as_ref()
    }

    /// Whether this is a simulated trade.
    #[must_use]
    pub const fn is_simulation(&self) -> bool {
        self.is_simulation
    }

    /// Last error observed, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True when the trade is halted for manual review after an invariant
    /// violation.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Get the submission timestamp.
    #[must_use]
    pub const fn submitted_at(&self) -> Option<Timestamp> {
        self.submitted_at
    }

    /// Get the full-execution timestamp.
    #[must_use]
    pub const fn executed_at(&self) -> Option<Timestamp> {
        self.executed_at
    }

    /// Get the close timestamp.
    #[must_use]
    pub const fn closed_at(&self) -> Option<Timestamp> {
        self.closed_at
    }

    /// Get the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Get the optimistic concurrency version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Bump the version after a successful persist.
    pub(crate) const fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// True when the trade holds an armed stop against an open position.
    #[must_use]
    pub fn has_armed_stop(&self) -> bool {
        self.status.is_open_position()
            && self
                .stop_loss_order
                .as_ref()
                .is_some_and(StopLossOrder::is_armed)
    }

    // ========================================================================
    // State Transitions
    // ========================================================================

    /// Mark the trade as submitted: the broker accepted the order.
    ///
    /// Generates a `TradeSubmitted` event.
    ///
    /// # Errors
    ///
    /// Returns error if the trade is not Pending or already holds a broker
    /// order id (placement must be idempotent at this layer).
    pub fn submit(&mut self, broker_order_id: BrokerOrderId) -> Result<(), TradeError> {
        if self.broker_order_id.is_some() {
            return Err(TradeError::InvariantViolation {
                invariant: "one broker order per trade".to_string(),
                state: format!("broker_order_id already set on trade {}", self.id),
            });
        }
        TradeStateMachine::validate_transition(self.status, TradeStatus::Submitted)?;

        self.broker_order_id = Some(broker_order_id.clone());
        self.status = TradeStatus::Submitted;
        self.submitted_at = Some(Timestamp::now());
        self.touch();

        self.events.push(TradeEvent::Submitted(TradeSubmitted {
            trade_id: self.id.clone(),
            broker_order_id,
            occurred_at: self.updated_at,
        }));

        Ok(())
    }

    /// Apply a broker execution to the trade.
    ///
    /// Duplicate execution ids are idempotently ignored. An out-of-order or
    /// over-filling event halts the trade for manual review and surfaces an
    /// invariant violation; financial state is never auto-corrected.
    ///
    /// Generates `TradeFilled` (and `TradeExecuted` / `StopLossArmed` when
    /// applicable) events.
    ///
    /// # Errors
    ///
    /// Returns error if the trade cannot receive fills or the event
    /// violates a fill invariant.
    pub fn apply_execution(&mut self, event: FillEvent) -> Result<FillOutcome, TradeError> {
        if self.halted {
            return Err(TradeError::InvariantViolation {
                invariant: "halted trade accepts no further mutation".to_string(),
                state: format!("trade {} awaiting manual review", self.id),
            });
        }
        if !self.status.can_fill() {
            return Err(TradeError::CannotFill {
                status: self.status,
            });
        }

        let fill_quantity = event.quantity;
        let fill_price = event.price;

        let outcome = match self.fills.apply(event) {
            Ok(outcome) => outcome,
            Err(DomainError::InvariantViolation {
                invariant, state, ..
            }) => {
                self.halted = true;
                self.last_error = Some(format!("{invariant} (state: {state})"));
                self.touch();
                return Err(TradeError::InvariantViolation { invariant, state });
            }
            Err(other) => {
                return Err(TradeError::InvariantViolation {
                    invariant: "fill application".to_string(),
                    state: other.to_string(),
                });
            }
        };

        if outcome == FillOutcome::Duplicate {
            return Ok(outcome);
        }

        let next = if self.fills.is_filled() {
            TradeStatus::Executed
        } else {
            TradeStatus::PartiallyFilled
        };
        TradeStateMachine::validate_transition(self.status, next)?;
        self.status = next;
        self.touch();

        self.events.push(TradeEvent::Filled(TradeFilled {
            trade_id: self.id.clone(),
            fill_quantity,
            fill_price,
            filled_quantity: self.fills.filled(),
            remaining_quantity: self.fills.remaining(),
            average_fill_price: self.fills.average_price(),
            occurred_at: self.updated_at,
        }));

        if self.status == TradeStatus::Executed {
            self.executed_at = Some(self.updated_at);
            self.events.push(TradeEvent::Executed(TradeExecuted {
                trade_id: self.id.clone(),
                average_fill_price: self.fills.average_price(),
                occurred_at: self.updated_at,
            }));
        }

        // Arm the protective stop at (first) fill time when one was requested.
        if let Some(stop_price) = self.stop_loss_price {
            if self.stop_loss_order.is_none() {
                self.stop_loss_order = Some(StopLossOrder::arm(self.id.clone(), stop_price));
                self.events.push(TradeEvent::StopArmed(StopLossArmed {
                    trade_id: self.id.clone(),
                    stop_price,
                    occurred_at: self.updated_at,
                }));
            }
        }

        Ok(outcome)
    }

    /// Trigger the protective stop after an adverse breach.
    ///
    /// Succeeds exactly once per arming; a second trigger is an invariant
    /// violation, so two overlapping sentinel sweeps can never both issue a
    /// force-close.
    ///
    /// Generates a `StopLossTriggered` event.
    ///
    /// # Errors
    ///
    /// Returns error if no stop is armed for an open position.
    pub fn trigger_stop(&mut self, breach_price: Money) -> Result<(), TradeError> {
        if !self.status.is_open_position() {
            return Err(TradeError::InvalidStateTransition {
                from: self.status,
                to: self.status,
                reason: "no open position to protect".to_string(),
            });
        }
        let stop = self
            .stop_loss_order
            .as_mut()
            .ok_or_else(|| TradeError::InvariantViolation {
                invariant: "stop trigger requires an armed stop order".to_string(),
                state: format!("trade {} has no stop order", self.id),
            })?;

        stop.trigger()
            .map_err(|e| match e {
                DomainError::InvariantViolation {
                    invariant, state, ..
                } => TradeError::InvariantViolation { invariant, state },
                other => TradeError::InvariantViolation {
                    invariant: "stop trigger".to_string(),
                    state: other.to_string(),
                },
            })?;

        self.touch();
        self.events.push(TradeEvent::StopTriggered(StopLossTriggered {
            trade_id: self.id.clone(),
            breach_price,
            occurred_at: self.updated_at,
        }));

        Ok(())
    }

    /// Record a failed force-close attempt against the triggered stop.
    ///
    /// Returns true when the escalation ceiling is reached and the stop is
    /// surfaced to an operator instead of retried.
    pub fn record_close_failure(&mut self, error: String, ceiling: u32) -> bool {
        self.last_error = Some(error);
        self.touch();
        self.stop_loss_order
            .as_mut()
            .is_some_and(|stop| stop.record_close_failure(ceiling))
    }

    /// Close the trade: the position has been flattened.
    ///
    /// Cancels an armed stop (closed via another path) and generates a
    /// `TradeClosed` event.
    ///
    /// # Errors
    ///
    /// Returns error if the trade is not Executed.
    pub fn close(&mut self) -> Result<(), TradeError> {
        TradeStateMachine::validate_transition(self.status, TradeStatus::Closed)?;

        self.status = TradeStatus::Closed;
        self.closed_at = Some(Timestamp::now());
        if let Some(stop) = self.stop_loss_order.as_mut() {
            stop.cancel();
        }
        self.touch();

        self.events.push(TradeEvent::Closed(TradeClosed {
            trade_id: self.id.clone(),
            occurred_at: self.updated_at,
        }));

        Ok(())
    }

    /// Cancel the trade; any filled remainder is retained in the record.
    ///
    /// Generates a `TradeCancelled` event.
    ///
    /// # Errors
    ///
    /// Returns error if the trade is not in a cancelable state (callers
    /// treat cancel on Executed/terminal trades as a no-op).
    pub fn cancel(&mut self) -> Result<(), TradeError> {
        if !self.status.is_cancelable() {
            return Err(TradeError::InvalidStateTransition {
                from: self.status,
                to: TradeStatus::Cancelled,
                reason: "trade is not cancelable".to_string(),
            });
        }
        TradeStateMachine::validate_transition(self.status, TradeStatus::Cancelled)?;

        self.status = TradeStatus::Cancelled;
        if let Some(stop) = self.stop_loss_order.as_mut() {
            stop.cancel();
        }
        self.touch();

        self.events.push(TradeEvent::Cancelled(TradeCancelled {
            trade_id: self.id.clone(),
            filled_quantity: self.fills.filled(),
            occurred_at: self.updated_at,
        }));

        Ok(())
    }

    /// Mark the trade as failed, preserving the last error.
    ///
    /// Generates a `TradeFailed` event.
    ///
    /// # Errors
    ///
    /// Returns error if the trade has fills or is terminal.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), TradeError> {
        TradeStateMachine::validate_transition(self.status, TradeStatus::Failed)?;

        let error = error.into();
        self.status = TradeStatus::Failed;
        self.last_error = Some(error.clone());
        if let Some(stop) = self.stop_loss_order.as_mut() {
            stop.cancel();
        }
        self.touch();

        self.events.push(TradeEvent::Failed(TradeFailed {
            trade_id: self.id.clone(),
            error,
            occurred_at: self.updated_at,
        }));

        Ok(())
    }

    /// Re-price an unfilled order after a broker replace.
    ///
    /// # Errors
    ///
    /// Returns error if the trade is not Submitted or already has fills.
    pub fn reprice(
        &mut self,
        pricing: OrderPricing,
        broker_order_id: BrokerOrderId,
    ) -> Result<(), TradeError> {
        if self.status != TradeStatus::Submitted || self.fills.filled().is_positive() {
            return Err(TradeError::InvalidStateTransition {
                from: self.status,
                to: TradeStatus::Submitted,
                reason: "only an unfilled submitted order can be replaced".to_string(),
            });
        }
        self.pricing = pricing;
        self.broker_order_id = Some(broker_order_id);
        self.touch();
        Ok(())
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Drain accumulated domain events.
    pub fn drain_events(&mut self) -> Vec<TradeEvent> {
        std::mem::take(&mut self.events)
    }

    /// Get pending events without draining.
    #[must_use]
    pub fn pending_events(&self) -> &[TradeEvent] {
        &self.events
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
