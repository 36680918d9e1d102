//! Strongly-typed identifiers for domain entities.
//!
//! These prevent mixing up IDs from different contexts.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a new unique identifier using UUID v4.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(TradeId, "Unique identifier for a trade (engine internal).");
define_id!(BrokerOrderId, "Broker's unique identifier for an order.");
define_id!(UserId, "Identifier for a platform user.");
define_id!(AccountId, "Broker account identifier (hash for Schwab).");
define_id!(
    ExecutionId,
    "Broker's unique identifier for a single execution (fill)."
);
define_id!(StopOrderId, "Unique identifier for a protective stop order.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_id_new_and_display() {
        let id = TradeId::new("trd-123");
        assert_eq!(id.as_str(), "trd-123");
        assert_eq!(format!("{id}"), "trd-123");
    }

    #[test]
    fn trade_id_generate_is_unique() {
        assert_ne!(TradeId::generate(), TradeId::generate());
    }

    #[test]
    fn trade_id_from_string() {
        let id: TradeId = "trd-123".into();
        assert_eq!(id.as_str(), "trd-123");

        let id: TradeId = String::from("trd-456").into();
        assert_eq!(id.as_str(), "trd-456");
    }

    #[test]
    fn broker_order_id_new() {
        let id = BrokerOrderId::new("schwab-ord-42");
        assert_eq!(id.as_str(), "schwab-ord-42");
    }

    #[test]
    fn execution_id_dedup_in_set() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(ExecutionId::new("exec-1"));
        set.insert(ExecutionId::new("exec-2"));
        set.insert(ExecutionId::new("exec-1")); // duplicate

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let id = UserId::new("user-7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"user-7\"");

        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
