//! Stop-loss sentinel.
//!
//! A recurring sweep over protected open positions: on an adverse breach
//! the stop order triggers exactly once and a market order flattens the
//! remaining position. The closing order bypasses the risk gate's opening
//! checks (closing risk is always permitted) but still goes through the
//! broker gateway.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::locks::TradeLockRegistry;
use crate::application::ports::{BrokerOrder, BrokerOrderGateway, MarketDataProvider};
use crate::domain::shared::{Timestamp, TradeId};
use crate::domain::stop_enforcement::{BreachCheck, BreachDetector, StopLossStatus};
use crate::domain::trade_lifecycle::aggregate::Trade;
use crate::domain::trade_lifecycle::repository::TradeRepository;
use crate::domain::trade_lifecycle::value_objects::{FillEvent, OrderRequest, TradeStatus};

/// Sentinel configuration.
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    /// Target sweep period in seconds.
    pub interval_secs: u64,
    /// Failed force-close attempts before escalating to an operator.
    pub close_attempt_ceiling: u32,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            close_attempt_ceiling: 5,
        }
    }
}

/// Result of one sentinel sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorReport {
    /// Positions examined this sweep.
    pub checked: usize,
    /// Stops that transitioned to triggered this sweep.
    pub triggered: usize,
    /// Force-close placements that failed this sweep.
    pub failed: usize,
    /// Positions escalated to an operator; no further automatic retries.
    pub escalated: Vec<TradeId>,
}

/// The stop-loss sentinel.
pub struct StopLossSentinel {
    repository: Arc<dyn TradeRepository>,
    gateway: Arc<dyn BrokerOrderGateway>,
    market_data: Arc<dyn MarketDataProvider>,
    locks: Arc<TradeLockRegistry>,
    config: SentinelConfig,
    sweep_guard: tokio::sync::Mutex<()>,
}

impl StopLossSentinel {
    /// Create a new sentinel.
    pub fn new(
        repository: Arc<dyn TradeRepository>,
        gateway: Arc<dyn BrokerOrderGateway>,
        market_data: Arc<dyn MarketDataProvider>,
        locks: Arc<TradeLockRegistry>,
        config: SentinelConfig,
    ) -> Self {
        Self {
            repository,
            gateway,
            market_data,
            locks,
            config,
            sweep_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Target sweep period in seconds.
    #[must_use]
    pub const fn interval_secs(&self) -> u64 {
        self.config.interval_secs
    }

    /// Run one sweep.
    ///
    /// At most one sweep runs at a time; a tick that overlaps a running
    /// sweep returns an empty report. Per-trade locks plus a stop-status
    /// re-check inside the lock guarantee a breach force-closes exactly
    /// once even when ticks do overlap.
    pub async fn monitor_tick(&self) -> MonitorReport {
        let Ok(_sweep) = self.sweep_guard.try_lock() else {
            return MonitorReport::default();
        };

        let mut report = MonitorReport::default();

        // Armed stops: check for fresh breaches.
        let armed = match self.repository.find_open_protected().await {
            Ok(trades) => trades,
            Err(err) => {
                error!(error = %err, "Sentinel could not load protected positions");
                return report;
            }
        };

        // Triggered stops whose force-close has not completed: retry.
        let pending = match self.repository.find_pending_force_close().await {
            Ok(trades) => trades,
            Err(err) => {
                error!(error = %err, "Sentinel could not load pending force-closes");
                Vec::new()
            }
        };

        for trade in armed {
            report.checked += 1;
            self.check_armed(trade.id().clone(), &mut report).await;
        }

        for trade in pending {
            report.checked += 1;
            self.retry_force_close(trade.id().clone(), &mut report).await;
        }

        info!(
            checked = report.checked,
            triggered = report.triggered,
            failed = report.failed,
            escalated = report.escalated.len(),
            "Sentinel sweep complete"
        );

        report
    }

    /// Check one armed position for a breach, triggering under the trade
    /// lock.
    async fn check_armed(&self, trade_id: TradeId, report: &mut MonitorReport) {
        let _guard = self.locks.acquire(&trade_id).await;

        // Reload inside the lock: a concurrent cancel/close may have
        // changed the trade since the sweep query.
        let Ok(Some(mut trade)) = self.repository.find_by_id(&trade_id).await else {
            return;
        };
        if !trade.has_armed_stop() {
            return;
        }
        let Some(stop_price) = trade.stop_loss_order().map(|s| s.stop_price()) else {
            return;
        };

        // Missing price data: skip this cycle, retry next cycle, no crash.
        let quote = match self.market_data.get_quote(trade.symbol()).await {
            Ok(quote) => quote,
            Err(err) => {
                warn!(
                    trade_id = %trade.id(),
                    symbol = %trade.symbol(),
                    error = %err,
                    "No price this cycle; skipping position"
                );
                return;
            }
        };

        let BreachCheck::StopBreached { price } =
            BreachDetector::check(trade.side(), quote.price, stop_price)
        else {
            return;
        };

        warn!(
            trade_id = %trade.id(),
            symbol = %trade.symbol(),
            price = %price,
            stop = %stop_price,
            "Stop-loss breached; triggering forced liquidation"
        );

        // Exactly-once: trigger transitions Armed -> Triggered and is
        // persisted before the close order is placed, so an overlapping
        // tick re-checking status cannot trigger again.
        if trade.trigger_stop(price).is_err() {
            return;
        }
        if let Err(err) = self.repository.save(&mut trade).await {
            error!(trade_id = %trade.id(), error = %err, "Failed to persist stop trigger");
            return;
        }
        report.triggered += 1;

        self.place_force_close(&mut trade, report).await;
    }

    /// Retry a force-close whose placement previously failed.
    async fn retry_force_close(&self, trade_id: TradeId, report: &mut MonitorReport) {
        let _guard = self.locks.acquire(&trade_id).await;

        let Ok(Some(mut trade)) = self.repository.find_by_id(&trade_id).await else {
            return;
        };
        let still_pending = trade.status().is_open_position()
            && trade
                .stop_loss_order()
                .is_some_and(|s| s.status() == StopLossStatus::Triggered && !s.is_escalated());
        if !still_pending {
            return;
        }

        self.place_force_close(&mut trade, report).await;
    }

    /// Place the market order that flattens the remaining position and
    /// close the parent trade.
    async fn place_force_close(&self, trade: &mut Trade, report: &mut MonitorReport) {
        // A partially filled parent may still have an open remainder at the
        // broker; cancel it (best effort) before flattening what's held.
        if !trade.is_simulation() && trade.remaining_quantity().is_positive() {
            if let Some(broker_order_id) = trade.broker_order_id().cloned() {
                let _ = self
                    .gateway
                    .cancel(trade.user_id(), trade.account_id(), &broker_order_id)
                    .await;
            }
        }

        let close_request = OrderRequest::market(
            trade.user_id().clone(),
            trade.account_id().clone(),
            trade.symbol().clone(),
            trade.side().closing_side(),
            trade.filled_quantity(),
        );
        let close_request = if trade.is_simulation() {
            close_request.simulated()
        } else {
            close_request
        };

        let Ok(mut closing_trade) = Trade::open(close_request) else {
            error!(trade_id = %trade.id(), "Could not build closing trade");
            return;
        };

        let placed = if trade.is_simulation() {
            self.fill_simulated_close(&mut closing_trade).await
        } else {
            let order = BrokerOrder {
                trade_id: closing_trade.id().clone(),
                user_id: closing_trade.user_id().clone(),
                account_id: closing_trade.account_id().clone(),
                symbol: closing_trade.symbol().clone(),
                side: closing_trade.side(),
                quantity: closing_trade.requested_quantity(),
                pricing: closing_trade.pricing(),
            };
            match self.gateway.place(&order).await {
                Ok(broker_order_id) => closing_trade.submit(broker_order_id).is_ok(),
                Err(err) => {
                    // Critical: the position is unprotected until this
                    // close lands. Stop stays Triggered; retried next
                    // cycle up to the escalation ceiling.
                    error!(
                        trade_id = %trade.id(),
                        symbol = %trade.symbol(),
                        error = %err,
                        "CRITICAL: force-close placement failed"
                    );
                    report.failed += 1;
                    let escalated = trade.record_close_failure(
                        err.to_string(),
                        self.config.close_attempt_ceiling,
                    );
                    if escalated {
                        error!(
                            trade_id = %trade.id(),
                            attempts = self.config.close_attempt_ceiling,
                            "Force-close escalated to operator; automatic retries stopped"
                        );
                        report.escalated.push(trade.id().clone());
                    }
                    let _ = self.repository.save(trade).await;
                    return;
                }
            }
        };

        if !placed {
            report.failed += 1;
            return;
        }

        if let Err(err) = self.repository.save(&mut closing_trade).await {
            error!(trade_id = %closing_trade.id(), error = %err, "Failed to persist closing trade");
            report.failed += 1;
            return;
        }

        // Executed parents close; partially filled parents cancel the
        // remainder and retain the filled quantity in the record.
        let transitioned = match trade.status() {
            TradeStatus::Executed => trade.close().is_ok(),
            _ => trade.cancel().is_ok(),
        };
        if transitioned {
            if let Err(err) = self.repository.save(trade).await {
                error!(trade_id = %trade.id(), error = %err, "Failed to persist closed trade");
            }
        }

        info!(
            trade_id = %trade.id(),
            closing_trade_id = %closing_trade.id(),
            quantity = %closing_trade.requested_quantity(),
            "Position flattened by sentinel"
        );
    }

    /// Synthetic close for simulated positions.
    async fn fill_simulated_close(&self, closing_trade: &mut Trade) -> bool {
        let Ok(quote) = self.market_data.get_quote(closing_trade.symbol()).await else {
            return false;
        };
        let broker_order_id =
            crate::domain::shared::BrokerOrderId::new(format!("sim-{}", uuid::Uuid::new_v4()));
        if closing_trade.submit(broker_order_id).is_err() {
            return false;
        }
        let fill = FillEvent::new(
            format!("sim-exec-{}", uuid::Uuid::new_v4()),
            1,
            closing_trade.remaining_quantity(),
            quote.price,
            Timestamp::now(),
        );
        closing_trade.apply_execution(fill).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::GatewayError;
    use crate::application::test_support::RecordingGateway;
    use crate::domain::shared::{AccountId, BrokerOrderId, Money, Quantity, Symbol, UserId};
    use crate::domain::trade_lifecycle::value_objects::TradeSide;
    use crate::infrastructure::market_data::FixedMarketData;
    use crate::infrastructure::persistence::InMemoryTradeStore;

    struct Harness {
        repository: Arc<InMemoryTradeStore>,
        gateway: Arc<RecordingGateway>,
        market_data: Arc<FixedMarketData>,
        sentinel: StopLossSentinel,
    }

    fn harness_with_ceiling(ceiling: u32) -> Harness {
        let repository = Arc::new(InMemoryTradeStore::new());
        let gateway = Arc::new(RecordingGateway::new());
        let market_data = Arc::new(FixedMarketData::new());
        let sentinel = StopLossSentinel::new(
            repository.clone(),
            gateway.clone(),
            market_data.clone(),
            Arc::new(TradeLockRegistry::new()),
            SentinelConfig {
                interval_secs: 60,
                close_attempt_ceiling: ceiling,
            },
        );
        Harness {
            repository,
            gateway,
            market_data,
            sentinel,
        }
    }

    fn harness() -> Harness {
        harness_with_ceiling(5)
    }

    /// Long 100 @ $10.00 with a stop at $9.50.
    async fn protected_long(h: &Harness) -> Trade {
        let mut trade = Trade::open(
            OrderRequest::market(
                UserId::new("user-1"),
                AccountId::new("acct-1"),
                Symbol::new("AAPL"),
                TradeSide::Buy,
                Quantity::from_i64(100),
            )
            .with_stop_loss(Money::usd(9.50)),
        )
        .unwrap();
        trade.submit(BrokerOrderId::new("broker-entry")).unwrap();
        trade
            .apply_execution(FillEvent::new(
                "e1",
                1,
                Quantity::from_i64(100),
                Money::usd(10.00),
                Timestamp::now(),
            ))
            .unwrap();
        h.repository.save(&mut trade).await.unwrap();
        trade
    }

    #[tokio::test]
    async fn no_breach_means_no_action() {
        let h = harness();
        let trade = protected_long(&h).await;
        h.market_data.set_price("AAPL", Money::usd(9.60));

        let report = h.sentinel.monitor_tick().await;

        assert_eq!(report.checked, 1);
        assert_eq!(report.triggered, 0);
        assert_eq!(h.gateway.place_count(), 0);

        let stored = h.repository.find_by_id(trade.id()).await.unwrap().unwrap();
        assert!(stored.has_armed_stop());
    }

    #[tokio::test]
    async fn breach_triggers_and_flattens() {
        let h = harness();
        let trade = protected_long(&h).await;
        h.market_data.set_price("AAPL", Money::usd(9.40));

        let report = h.sentinel.monitor_tick().await;

        assert_eq!(report.checked, 1);
        assert_eq!(report.triggered, 1);
        assert_eq!(report.failed, 0);

        // Exactly one market sell for the full position.
        let placed = h.gateway.placed.lock().unwrap().clone();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].side, TradeSide::Sell);
        assert_eq!(placed[0].quantity, Quantity::from_i64(100));
        assert_eq!(
            placed[0].pricing,
            crate::domain::trade_lifecycle::value_objects::OrderPricing::Market
        );

        // Parent closed; stop order triggered.
        let stored = h.repository.find_by_id(trade.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), TradeStatus::Closed);
        assert_eq!(
            stored.stop_loss_order().unwrap().status(),
            StopLossStatus::Triggered
        );

        // One closing trade exists alongside the parent.
        assert_eq!(h.repository.len(), 2);
    }

    #[tokio::test]
    async fn double_tick_issues_exactly_one_force_close() {
        let h = harness();
        protected_long(&h).await;
        h.market_data.set_price("AAPL", Money::usd(9.40));

        let first = h.sentinel.monitor_tick().await;
        let second = h.sentinel.monitor_tick().await;

        assert_eq!(first.triggered, 1);
        assert_eq!(second.triggered, 0);
        assert_eq!(h.gateway.place_count(), 1);
    }

    #[tokio::test]
    async fn missing_price_skips_cycle_without_crash() {
        let h = harness();
        let trade = protected_long(&h).await;
        // No price set for AAPL.

        let report = h.sentinel.monitor_tick().await;

        assert_eq!(report.checked, 1);
        assert_eq!(report.triggered, 0);
        assert_eq!(report.failed, 0);

        // Retry next cycle: the stop is still armed.
        let stored = h.repository.find_by_id(trade.id()).await.unwrap().unwrap();
        assert!(stored.has_armed_stop());
    }

    #[tokio::test]
    async fn failed_force_close_retries_next_cycle() {
        let h = harness();
        let trade = protected_long(&h).await;
        h.market_data.set_price("AAPL", Money::usd(9.40));
        h.gateway.push_place_result(Err(GatewayError::Connection {
            message: "broker unavailable".to_string(),
        }));

        let first = h.sentinel.monitor_tick().await;
        assert_eq!(first.triggered, 1);
        assert_eq!(first.failed, 1);

        // Stop remains triggered, not re-armed and not re-triggered.
        let stored = h.repository.find_by_id(trade.id()).await.unwrap().unwrap();
        assert_eq!(
            stored.stop_loss_order().unwrap().status(),
            StopLossStatus::Triggered
        );
        assert_eq!(stored.status(), TradeStatus::Executed);

        // Next cycle the placement succeeds and the position closes.
        let second = h.sentinel.monitor_tick().await;
        assert_eq!(second.failed, 0);
        let stored = h.repository.find_by_id(trade.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), TradeStatus::Closed);
        // Two placements total: the failed one and the retry.
        assert_eq!(h.gateway.place_count(), 2);
    }

    #[tokio::test]
    async fn repeated_close_failures_escalate_at_ceiling() {
        let h = harness_with_ceiling(2);
        let trade = protected_long(&h).await;
        h.market_data.set_price("AAPL", Money::usd(9.40));
        for _ in 0..3 {
            h.gateway.push_place_result(Err(GatewayError::Connection {
                message: "broker unavailable".to_string(),
            }));
        }

        let first = h.sentinel.monitor_tick().await;
        assert_eq!(first.failed, 1);
        assert!(first.escalated.is_empty());

        let second = h.sentinel.monitor_tick().await;
        assert_eq!(second.failed, 1);
        assert_eq!(second.escalated, vec![trade.id().clone()]);

        // Escalated positions are surfaced to an operator, not retried.
        let third = h.sentinel.monitor_tick().await;
        assert_eq!(third.checked, 0);
        assert_eq!(h.gateway.place_count(), 2);

        let stored = h.repository.find_by_id(trade.id()).await.unwrap().unwrap();
        assert!(stored.stop_loss_order().unwrap().is_escalated());
        assert!(stored.last_error().is_some());
    }

    #[tokio::test]
    async fn short_position_breaches_upward() {
        let h = harness();
        let mut trade = Trade::open(
            OrderRequest::market(
                UserId::new("user-1"),
                AccountId::new("acct-1"),
                Symbol::new("AAPL"),
                TradeSide::Sell,
                Quantity::from_i64(100),
            )
            .with_stop_loss(Money::usd(10.50)),
        )
        .unwrap();
        trade.submit(BrokerOrderId::new("broker-entry")).unwrap();
        trade
            .apply_execution(FillEvent::new(
                "e1",
                1,
                Quantity::from_i64(100),
                Money::usd(10.00),
                Timestamp::now(),
            ))
            .unwrap();
        h.repository.save(&mut trade).await.unwrap();

        h.market_data.set_price("AAPL", Money::usd(10.60));

        let report = h.sentinel.monitor_tick().await;
        assert_eq!(report.triggered, 1);

        let placed = h.gateway.placed.lock().unwrap().clone();
        assert_eq!(placed[0].side, TradeSide::Buy);
    }

    #[tokio::test]
    async fn partially_filled_position_flattens_filled_quantity() {
        let h = harness();
        let mut trade = Trade::open(
            OrderRequest::market(
                UserId::new("user-1"),
                AccountId::new("acct-1"),
                Symbol::new("AAPL"),
                TradeSide::Buy,
                Quantity::from_i64(100),
            )
            .with_stop_loss(Money::usd(9.50)),
        )
        .unwrap();
        trade.submit(BrokerOrderId::new("broker-entry")).unwrap();
        trade
            .apply_execution(FillEvent::new(
                "e1",
                1,
                Quantity::from_i64(60),
                Money::usd(10.00),
                Timestamp::now(),
            ))
            .unwrap();
        h.repository.save(&mut trade).await.unwrap();

        h.market_data.set_price("AAPL", Money::usd(9.40));

        let report = h.sentinel.monitor_tick().await;
        assert_eq!(report.triggered, 1);

        // The open remainder is cancelled, then the held 60 shares sold.
        assert_eq!(h.gateway.cancelled.lock().unwrap().len(), 1);
        let placed = h.gateway.placed.lock().unwrap().clone();
        assert_eq!(placed[0].quantity, Quantity::from_i64(60));

        // Parent retains the filled remainder in a terminal record.
        let stored = h.repository.find_by_id(trade.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), TradeStatus::Cancelled);
        assert_eq!(stored.filled_quantity(), Quantity::from_i64(60));
    }

    #[tokio::test]
    async fn simulated_position_closes_without_broker() {
        let h = harness();
        let mut trade = Trade::open(
            OrderRequest::market(
                UserId::new("user-1"),
                AccountId::new("acct-1"),
                Symbol::new("AAPL"),
                TradeSide::Buy,
                Quantity::from_i64(100),
            )
            .with_stop_loss(Money::usd(9.50))
            .simulated(),
        )
        .unwrap();
        trade.submit(BrokerOrderId::new("sim-entry")).unwrap();
        trade
            .apply_execution(FillEvent::new(
                "sim-e1",
                1,
                Quantity::from_i64(100),
                Money::usd(10.00),
                Timestamp::now(),
            ))
            .unwrap();
        h.repository.save(&mut trade).await.unwrap();

        h.market_data.set_price("AAPL", Money::usd(9.40));

        let report = h.sentinel.monitor_tick().await;
        assert_eq!(report.triggered, 1);
        assert_eq!(h.gateway.place_count(), 0);

        let stored = h.repository.find_by_id(trade.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), TradeStatus::Closed);
    }

    #[tokio::test]
    async fn empty_sweep_reports_nothing() {
        let h = harness();
        let report = h.sentinel.monitor_tick().await;
        assert_eq!(report, MonitorReport::default());
    }
}
