//! Risk management context: per-user limits and the fail-closed risk gate.

mod services;
mod value_objects;

pub use services::{RiskGate, RiskInputs};
pub use value_objects::{PortfolioSnapshot, RiskDecision, RiskDenial, RiskLimitConfig};
