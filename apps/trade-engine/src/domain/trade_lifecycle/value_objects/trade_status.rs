//! Trade status in the lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical trade status.
///
/// Lifecycle: `Pending -> Submitted -> {PartiallyFilled <-> (more fills) | Executed} -> Closed`.
/// Alternate paths: `Submitted -> Failed` (terminal) and any non-terminal
/// state `-> Cancelled` (terminal, filled remainder retained).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    /// Trade created and risk-approved, not yet at the broker.
    Pending,
    /// Order accepted by the broker, awaiting fills.
    Submitted,
    /// Some but not all of the requested quantity has filled.
    PartiallyFilled,
    /// Full requested quantity has filled; position is open.
    Executed,
    /// Position flattened; trade complete.
    Closed,
    /// Cancelled before (full) execution; any filled remainder is retained.
    Cancelled,
    /// Broker submission failed after retries; last error preserved.
    Failed,
}

impl TradeStatus {
    /// Returns true if the trade is in a terminal state.
    ///
    /// Terminal trades permit no further mutation except audit metadata.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled | Self::Failed)
    }

    /// Returns true if the trade can receive fills.
    #[must_use]
    pub const fn can_fill(&self) -> bool {
        matches!(self, Self::Submitted | Self::PartiallyFilled)
    }

    /// Returns true if the trade represents an open position.
    #[must_use]
    pub const fn is_open_position(&self) -> bool {
        matches!(self, Self::PartiallyFilled | Self::Executed)
    }

    /// Returns true if a cancel request can still change this trade.
    ///
    /// An Executed trade is not cancellable: there is nothing left at the
    /// broker to cancel, and a cancel request against it is a no-op.
    #[must_use]
    pub const fn is_cancelable(&self) -> bool {
        matches!(self, Self::Pending | Self::Submitted | Self::PartiallyFilled)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Submitted => write!(f, "submitted"),
            Self::PartiallyFilled => write!(f, "partially_filled"),
            Self::Executed => write!(f, "executed"),
            Self::Closed => write!(f, "closed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
