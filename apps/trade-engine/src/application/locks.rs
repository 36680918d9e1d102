//! Per-trade mutual exclusion.
//!
//! Every read-modify-write of a trade - user-initiated or sentinel-driven -
//! acquires that trade's lock first, so a cancel racing a concurrently
//! triggering stop-loss serializes instead of corrupting state. The
//! repository's optimistic version check backs this up across processes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::shared::TradeId;

/// Registry of per-trade async locks.
#[derive(Debug, Default)]
pub struct TradeLockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TradeLockRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the lock for a trade, creating it on first use.
    pub async fn acquire(&self, trade_id: &TradeId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(
                locks
                    .entry(trade_id.as_str().to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// Number of trades with a registered lock.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// True when no locks are registered.
    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}
