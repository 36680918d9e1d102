//! Use cases orchestrating the domain against the ports.

mod cancel_order;
mod monitor_stops;
mod replace_order;
mod submit_order;
mod sync_fills;

pub use cancel_order::CancelOrderUseCase;
pub use monitor_stops::{MonitorReport, SentinelConfig, StopLossSentinel};
pub use replace_order::ReplaceOrderUseCase;
pub use submit_order::SubmitOrderUseCase;
pub use sync_fills::SyncFillsUseCase;
