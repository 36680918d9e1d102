//! Value objects for stop enforcement.

mod stop_loss_order;

pub use stop_loss_order::{StopLossOrder, StopLossStatus};
