//! Driven ports: interfaces the engine consumes.

mod broker_port;
mod credential_port;
mod market_data_port;
mod risk_port;

pub use broker_port::{BrokerOrder, BrokerOrderGateway, GatewayError, ReplaceTerms};
pub use credential_port::{BearerToken, BrokerProvider, CredentialError, CredentialProvider};
pub use market_data_port::{MarketDataError, MarketDataProvider, MarketSession, Quote};
pub use risk_port::{PortfolioSource, RiskConfigSource, RiskDataError};
