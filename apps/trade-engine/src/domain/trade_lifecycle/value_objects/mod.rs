//! Value objects for the trade lifecycle context.

mod fill_event;
mod fill_ledger;
mod order_request;
mod trade_side;
mod trade_status;

pub use fill_event::FillEvent;
pub use fill_ledger::{FillLedger, FillOutcome};
pub use order_request::{OrderPricing, OrderRequest};
pub use trade_side::{AssetClass, TradeSide};
pub use trade_status::TradeStatus;
