// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::default_trait_access
    )
)]

//! Trade Engine - Rust Core Library
//!
//! Trade lifecycle and automated risk-enforcement engine for the
//! Breakwater trading platform.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside -> outside)
//!
//! - **Domain**: Core business logic (aggregates, value objects, services)
//!   - `trade_lifecycle`: Trade aggregate, status lifecycle, fill ledger
//!   - `risk_management`: Per-user limits and the fail-closed risk gate
//!   - `stop_enforcement`: Protective stop orders, breach detection
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: Interfaces for external systems (`BrokerOrderGateway`,
//!     `MarketDataProvider`, `CredentialProvider`)
//!   - `use_cases`: submit / cancel / replace / sync-fills / the stop-loss
//!     sentinel
//!   - `engine`: The `TradeEngine` facade and per-trade locking
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `broker`: Schwab gateway with retry/backoff/token refresh
//!   - `market_data`: Schwab quotes + fixed test source
//!   - `credentials`: In-memory credential store
//!   - `persistence`: Trade store with optimistic versioning

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - core business logic with no external dependencies.
pub mod domain;

/// Application layer - use cases and port definitions.
pub mod application;

/// Infrastructure layer - adapters and external integrations.
pub mod infrastructure;

/// Engine configuration.
pub mod config;

/// Engine-level error taxonomy.
pub mod error;

/// Tracing setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::risk_management::{
    PortfolioSnapshot, RiskDecision, RiskDenial, RiskGate, RiskInputs, RiskLimitConfig,
};
pub use domain::shared::{
    AccountId, BrokerOrderId, ExecutionId, Money, Quantity, StopOrderId, Symbol, Timestamp,
    TradeId, UserId,
};
pub use domain::stop_enforcement::{BreachCheck, BreachDetector, StopLossOrder, StopLossStatus};
pub use domain::trade_lifecycle::aggregate::Trade;
pub use domain::trade_lifecycle::repository::TradeRepository;
pub use domain::trade_lifecycle::value_objects::{
    AssetClass, FillEvent, OrderPricing, OrderRequest, TradeSide, TradeStatus,
};

// Application re-exports
pub use application::engine::TradeEngine;
pub use application::ports::{
    BearerToken, BrokerOrder, BrokerOrderGateway, BrokerProvider, CredentialProvider,
    GatewayError, MarketDataProvider, MarketSession, PortfolioSource, Quote, ReplaceTerms,
    RiskConfigSource,
};
pub use application::use_cases::{MonitorReport, SentinelConfig};

// Infrastructure re-exports
pub use infrastructure::broker::schwab::{
    SchwabBrokerGateway, SchwabEnvironment, SchwabError, SchwabGatewayConfig,
};
pub use infrastructure::credentials::InMemoryCredentialStore;
pub use infrastructure::market_data::{FixedMarketData, SchwabMarketDataAdapter};
pub use infrastructure::persistence::InMemoryTradeStore;
pub use infrastructure::risk::{InMemoryRiskConfigStore, LedgerPortfolioSource};

pub use config::EngineConfig;
pub use error::EngineError;
