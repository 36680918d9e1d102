//! Risk configuration and portfolio adapters.

mod sources;

pub use sources::{InMemoryRiskConfigStore, LedgerPortfolioSource};
