//! Trade engine facade.
//!
//! The sole surface exposed to strategy/command and reporting
//! collaborators. Wires the use cases over shared ports and owns the
//! per-trade lock registry that serializes user-initiated mutation against
//! the sentinel.

use std::sync::Arc;

use crate::application::locks::TradeLockRegistry;
use crate::application::ports::{
    BrokerOrderGateway, MarketDataProvider, PortfolioSource, ReplaceTerms, RiskConfigSource,
};
use crate::application::use_cases::{
    CancelOrderUseCase, MonitorReport, ReplaceOrderUseCase, SentinelConfig, StopLossSentinel,
    SubmitOrderUseCase, SyncFillsUseCase,
};
use crate::domain::risk_management::RiskGate;
use crate::domain::shared::TradeId;
use crate::domain::trade_lifecycle::aggregate::Trade;
use crate::domain::trade_lifecycle::errors::TradeError;
use crate::domain::trade_lifecycle::repository::TradeRepository;
use crate::domain::trade_lifecycle::value_objects::OrderRequest;
use crate::error::EngineError;

/// The trade lifecycle and risk-enforcement engine.
pub struct TradeEngine {
    repository: Arc<dyn TradeRepository>,
    submit: SubmitOrderUseCase,
    cancel: CancelOrderUseCase,
    replace: ReplaceOrderUseCase,
    sync: SyncFillsUseCase,
    sentinel: StopLossSentinel,
}

impl TradeEngine {
    /// Construct the engine over its ports.
    pub fn new(
        repository: Arc<dyn TradeRepository>,
        gateway: Arc<dyn BrokerOrderGateway>,
        market_data: Arc<dyn MarketDataProvider>,
        risk_config: Arc<dyn RiskConfigSource>,
        portfolio: Arc<dyn PortfolioSource>,
        sentinel_config: SentinelConfig,
    ) -> Self {
        let locks = Arc::new(TradeLockRegistry::new());

        Self {
            repository: Arc::clone(&repository),
            submit: SubmitOrderUseCase::new(
                Arc::clone(&repository),
                Arc::clone(&gateway),
                Arc::clone(&market_data),
                risk_config,
                portfolio,
                RiskGate::new(),
            ),
            cancel: CancelOrderUseCase::new(
                Arc::clone(&repository),
                Arc::clone(&gateway),
                Arc::clone(&locks),
            ),
            replace: ReplaceOrderUseCase::new(
                Arc::clone(&repository),
                Arc::clone(&gateway),
                Arc::clone(&locks),
            ),
            sync: SyncFillsUseCase::new(
                Arc::clone(&repository),
                Arc::clone(&gateway),
                Arc::clone(&locks),
            ),
            sentinel: StopLossSentinel::new(
                repository,
                gateway,
                market_data,
                locks,
                sentinel_config,
            ),
        }
    }

    /// Submit an order for a user. Sole entrypoint for strategy/command
    /// collaborators.
    ///
    /// # Errors
    ///
    /// Returns a validation error, structured risk denial, or the gateway
    /// error that failed the trade.
    pub async fn submit_order(&self, request: OrderRequest) -> Result<Trade, EngineError> {
        self.submit.execute(request).await
    }

    /// Cancel a trade. A no-op returning the unchanged trade when the
    /// trade is already executed or terminal.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a gateway error.
    pub async fn cancel_order(&self, trade_id: &TradeId) -> Result<Trade, EngineError> {
        self.cancel.execute(trade_id).await
    }

    /// Replace an unfilled submitted order's terms.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, an invalid-transition error, or a gateway error.
    pub async fn replace_order(
        &self,
        trade_id: &TradeId,
        terms: ReplaceTerms,
    ) -> Result<Trade, EngineError> {
        self.replace.execute(trade_id, terms).await
    }

    /// Pull broker executions into a trade's canonical state.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, a gateway error, or the invariant violation
    /// that halted the trade.
    pub async fn sync_fills(&self, trade_id: &TradeId) -> Result<Trade, EngineError> {
        self.sync.execute(trade_id).await
    }

    /// Get a trade snapshot for reporting/UI collaborators.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown trade.
    pub async fn get_trade(&self, trade_id: &TradeId) -> Result<Trade, EngineError> {
        self.repository
            .find_by_id(trade_id)
            .await?
            .ok_or_else(|| {
                EngineError::Trade(TradeError::NotFound {
                    trade_id: trade_id.as_str().to_string(),
                })
            })
    }

    /// Run one sentinel sweep. Invoked by the external scheduler.
    pub async fn monitor_tick(&self) -> MonitorReport {
        self.sentinel.monitor_tick().await
    }

    /// The sentinel's target sweep period in seconds.
    #[must_use]
    pub const fn sentinel_interval_secs(&self) -> u64 {
        self.sentinel.interval_secs()
    }
}
