//! Stop enforcement context: protective stop orders and breach detection.

mod services;
mod value_objects;

pub use services::{BreachCheck, BreachDetector};
pub use value_objects::{StopLossOrder, StopLossStatus};
