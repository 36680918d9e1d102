//! Risk management domain services.

mod risk_gate;

pub use risk_gate::{RiskGate, RiskInputs};
