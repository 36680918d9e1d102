//! Stop enforcement domain services.

mod breach_detector;

pub use breach_detector::{BreachCheck, BreachDetector};
