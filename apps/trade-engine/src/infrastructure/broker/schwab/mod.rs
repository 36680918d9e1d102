//! Schwab Trader API integration.

mod adapter;
mod api_types;
mod config;
mod error;
mod http_client;

pub use adapter::SchwabBrokerGateway;
pub use api_types::{SchwabOrderDetail, SchwabOrderRequest, SchwabOrderResponse};
pub use config::{SchwabEnvironment, SchwabGatewayConfig};
pub use error::SchwabError;
pub use http_client::SchwabHttpClient;
