//! Market data adapters.

mod fixed;
mod schwab;

pub use fixed::FixedMarketData;
pub use schwab::{SchwabMarketDataAdapter, SchwabMarketDataConfig};
