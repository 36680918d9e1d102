//! Trade engine binary.
//!
//! Wires the adapters, constructs the engine, and drives the stop-loss
//! sentinel on its interval until shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use trade_engine::application::engine::TradeEngine;
use trade_engine::config::EngineConfig;
use trade_engine::infrastructure::broker::schwab::SchwabBrokerGateway;
use trade_engine::infrastructure::credentials::InMemoryCredentialStore;
use trade_engine::infrastructure::market_data::{SchwabMarketDataAdapter, SchwabMarketDataConfig};
use trade_engine::infrastructure::persistence::InMemoryTradeStore;
use trade_engine::infrastructure::risk::{InMemoryRiskConfigStore, LedgerPortfolioSource};
use trade_engine::telemetry::init_telemetry;
use trade_engine::UserId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry();

    let config = EngineConfig::from_env();
    info!(
        environment = ?config.gateway.environment,
        sentinel_interval_secs = config.sentinel.interval_secs,
        "Starting trade engine"
    );

    let credentials = Arc::new(InMemoryCredentialStore::new());
    let repository = Arc::new(InMemoryTradeStore::new());

    let gateway = Arc::new(
        SchwabBrokerGateway::new(config.gateway.clone(), credentials.clone())
            .context("building broker gateway")?,
    );

    let market_data = Arc::new(
        SchwabMarketDataAdapter::new(
            SchwabMarketDataConfig {
                gateway: config.gateway.clone(),
                data_user: UserId::new("market-data"),
                max_quote_age_secs: 30,
            },
            credentials.clone(),
        )
        .context("building market data adapter")?,
    );

    let risk_config = Arc::new(InMemoryRiskConfigStore::new());
    let portfolio = Arc::new(LedgerPortfolioSource::new(repository.clone()));

    let engine = Arc::new(TradeEngine::new(
        repository,
        gateway,
        market_data,
        risk_config,
        portfolio,
        config.sentinel,
    ));

    let shutdown = CancellationToken::new();

    // The sentinel runs as an independently scheduled recurring task,
    // decoupled from any request. The interval loop skips a tick rather
    // than overlapping a running sweep.
    let sentinel_handle = {
        let engine = Arc::clone(&engine);
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let period = Duration::from_secs(engine.sentinel_interval_secs());
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let report = engine.monitor_tick().await;
                        if report.checked > 0 || !report.escalated.is_empty() {
                            info!(
                                checked = report.checked,
                                triggered = report.triggered,
                                failed = report.failed,
                                escalated = report.escalated.len(),
                                "Sentinel tick"
                            );
                        }
                        for trade_id in &report.escalated {
                            error!(
                                trade_id = %trade_id,
                                "OPERATOR ACTION REQUIRED: force-close escalated"
                            );
                        }
                    }
                }
            }
            info!("Sentinel loop stopped");
        })
    };

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown signal received");

    shutdown.cancel();
    sentinel_handle.await.context("joining sentinel loop")?;

    info!("Trade engine stopped");
    Ok(())
}
