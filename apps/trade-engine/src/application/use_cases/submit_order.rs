//! Submit order use case.
//!
//! Validates the request, gates it against the user's risk limits
//! (fail-closed), and places it at the broker. Risk evaluation and
//! placement run synchronously within the originating request.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::ports::{
    BrokerOrder, BrokerOrderGateway, MarketDataProvider, MarketSession, PortfolioSource,
    RiskConfigSource,
};
use crate::domain::risk_management::{RiskDecision, RiskDenial, RiskGate, RiskInputs};
use crate::domain::shared::{BrokerOrderId, Money, Timestamp};
use crate::domain::trade_lifecycle::aggregate::Trade;
use crate::domain::trade_lifecycle::repository::TradeRepository;
use crate::domain::trade_lifecycle::value_objects::{FillEvent, OrderRequest};
use crate::error::EngineError;

/// Seconds in the rolling daily-trade window.
const DAILY_WINDOW_SECS: i64 = 24 * 60 * 60;

/// Use case for submitting an order.
pub struct SubmitOrderUseCase {
    repository: Arc<dyn TradeRepository>,
    gateway: Arc<dyn BrokerOrderGateway>,
    market_data: Arc<dyn MarketDataProvider>,
    risk_config: Arc<dyn RiskConfigSource>,
    portfolio: Arc<dyn PortfolioSource>,
    risk_gate: RiskGate,
}

impl SubmitOrderUseCase {
    /// Create a new submit use case.
    pub fn new(
        repository: Arc<dyn TradeRepository>,
        gateway: Arc<dyn BrokerOrderGateway>,
        market_data: Arc<dyn MarketDataProvider>,
        risk_config: Arc<dyn RiskConfigSource>,
        portfolio: Arc<dyn PortfolioSource>,
        risk_gate: RiskGate,
    ) -> Self {
        Self {
            repository,
            gateway,
            market_data,
            risk_config,
            portfolio,
            risk_gate,
        }
    }

    /// Submit an order: validate, gate, persist, place.
    ///
    /// Denied orders produce no trade row; the structured denial is the
    /// result. Transient broker errors are retried inside the gateway; on
    /// exhaustion the trade transitions to Failed with the last error
    /// preserved.
    ///
    /// # Errors
    ///
    /// Returns validation errors, a structured risk denial, or the gateway
    /// error that failed the trade.
    pub async fn execute(&self, request: OrderRequest) -> Result<Trade, EngineError> {
        request.validate().map_err(EngineError::Trade)?;

        let notional = match self.reference_notional(&request).await {
            Some(notional) => notional,
            None => {
                return Err(EngineError::RiskDenied {
                    denial: RiskDenial::Unverifiable {
                        source: "reference price".to_string(),
                    },
                });
            }
        };

        let inputs = self.gather_inputs(&request).await;
        match self.risk_gate.evaluate(&request, notional, &inputs) {
            RiskDecision::Allow => {}
            RiskDecision::Deny(denial) => {
                return Err(EngineError::RiskDenied { denial });
            }
        }

        let mut trade = Trade::open(request).map_err(EngineError::Trade)?;
        self.repository.save(&mut trade).await?;

        if trade.is_simulation() {
            self.fill_simulated(&mut trade).await?;
            return Ok(trade);
        }

        // Idempotency guard: never re-place an order the broker already has.
        if trade.broker_order_id().is_some() {
            return Ok(trade);
        }

        let order = BrokerOrder {
            trade_id: trade.id().clone(),
            user_id: trade.user_id().clone(),
            account_id: trade.account_id().clone(),
            symbol: trade.symbol().clone(),
            side: trade.side(),
            quantity: trade.remaining_quantity(),
            pricing: trade.pricing(),
        };

        match self.gateway.place(&order).await {
            Ok(broker_order_id) => {
                trade.submit(broker_order_id).map_err(EngineError::Trade)?;
                self.repository.save(&mut trade).await?;
                info!(
                    trade_id = %trade.id(),
                    broker_order_id = ?trade.broker_order_id(),
                    symbol = %trade.symbol(),
                    "Order submitted to broker"
                );
                Ok(trade)
            }
            Err(err) => {
                warn!(
                    trade_id = %trade.id(),
                    error = %err,
                    "Broker placement failed; marking trade failed"
                );
                trade.mark_failed(err.to_string()).map_err(EngineError::Trade)?;
                self.repository.save(&mut trade).await?;
                Err(EngineError::Gateway(err))
            }
        }
    }

    /// Notional value of the request at its reference price.
    ///
    /// Limit orders price at their limit; market/stop orders price at the
    /// current quote. None when no reference price is obtainable.
    async fn reference_notional(&self, request: &OrderRequest) -> Option<Money> {
        let price = match request.pricing.limit_price() {
            Some(limit) => limit,
            None => match self.market_data.get_quote(&request.symbol).await {
                Ok(quote) => quote.price,
                Err(err) => {
                    warn!(symbol = %request.symbol, error = %err, "No reference price for order");
                    return None;
                }
            },
        };
        Some(price.notional(request.quantity))
    }

    /// Gather risk inputs; each unavailable input stays None and resolves
    /// to a fail-closed denial inside the gate.
    async fn gather_inputs(&self, request: &OrderRequest) -> RiskInputs {
        let config = match self.risk_config.limits_for(&request.user_id).await {
            Ok(config) => Some(config),
            Err(err) => {
                warn!(user_id = %request.user_id, error = %err, "Risk config unavailable");
                None
            }
        };

        let portfolio = match self.portfolio.snapshot_for(&request.user_id).await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(user_id = %request.user_id, error = %err, "Portfolio snapshot unavailable");
                None
            }
        };

        let cutoff = Timestamp::now().seconds_ago(DAILY_WINDOW_SECS);
        let trades_last_24h = match self
            .repository
            .count_submitted_since(&request.user_id, cutoff)
            .await
        {
            Ok(count) => Some(count),
            Err(err) => {
                warn!(user_id = %request.user_id, error = %err, "Daily trade count unavailable");
                None
            }
        };

        let market_open = match self.market_data.market_session().await {
            Ok(session) => Some(session == MarketSession::Open),
            Err(err) => {
                warn!(error = %err, "Market session unavailable");
                None
            }
        };

        RiskInputs {
            config,
            portfolio,
            trades_last_24h,
            market_open,
        }
    }

    /// Simulated trades never reach the broker: synthetic order id and an
    /// immediate synthetic fill at the current quote.
    async fn fill_simulated(&self, trade: &mut Trade) -> Result<(), EngineError> {
        let quote = self.market_data.get_quote(trade.symbol()).await?;

        let broker_order_id = BrokerOrderId::new(format!("sim-{}", uuid::Uuid::new_v4()));
        trade.submit(broker_order_id).map_err(EngineError::Trade)?;

        let fill = FillEvent::new(
            format!("sim-exec-{}", uuid::Uuid::new_v4()),
            1,
            trade.remaining_quantity(),
            quote.price,
            Timestamp::now(),
        );
        trade.apply_execution(fill).map_err(EngineError::Trade)?;
        self.repository.save(trade).await?;

        info!(
            trade_id = %trade.id(),
            symbol = %trade.symbol(),
            price = %quote.price,
            "Simulated trade filled at quote"
        );
        Ok(())
    }
}
