//! Schwab-specific error types.

use thiserror::Error;

use crate::application::ports::GatewayError;

/// Errors from the Schwab adapter.
#[derive(Debug, Error, Clone)]
pub enum SchwabError {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// API returned an error body.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Order rejected by the broker.
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// Account lacks buying power.
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// Market closed for this order.
    #[error("Market closed")]
    MarketClosed,

    /// Authentication failed after the transparent refresh attempt.
    #[error("Authentication failed; re-authorization required")]
    AuthenticationFailed,

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs:?}s")]
    RateLimited {
        /// Suggested retry delay in seconds.
        retry_after_secs: Option<u64>,
    },

    /// Retry budget exhausted; last error preserved.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// Attempts made before giving up.
        attempts: u32,
        /// The final error observed.
        last_error: String,
    },

    /// JSON parsing failure.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Order id unknown at the broker.
    #[error("Order not found: {order_id}")]
    OrderNotFound {
        /// The missing order id.
        order_id: String,
    },
}

impl From<SchwabError> for GatewayError {
    fn from(err: SchwabError) -> Self {
        match err {
            SchwabError::Http(message) | SchwabError::JsonParse(message) => {
                Self::Connection { message }
            }
            SchwabError::MaxRetriesExceeded {
                attempts,
                last_error,
            } => Self::Connection {
                message: format!("max retries exceeded after {attempts} attempts: {last_error}"),
            },
            SchwabError::Api { status, message } => Self::Rejected {
                reason: format!("{status}: {message}"),
            },
            SchwabError::OrderRejected(reason) => Self::InvalidOrder { reason },
            SchwabError::InsufficientFunds => Self::InsufficientFunds,
            SchwabError::MarketClosed => Self::MarketClosed,
            SchwabError::AuthenticationFailed => Self::ReauthRequired,
            SchwabError::RateLimited { retry_after_secs } => {
                Self::RateLimited { retry_after_secs }
            }
            SchwabError::OrderNotFound { order_id } => Self::OrderNotFound { order_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_maps_to_connection() {
        let err: GatewayError = SchwabError::Http("connection refused".to_string()).into();
        assert!(matches!(err, GatewayError::Connection { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn retries_exceeded_preserves_last_error() {
        let err: GatewayError = SchwabError::MaxRetriesExceeded {
            attempts: 3,
            last_error: "connect timed out".to_string(),
        }
        .into();
        match err {
            GatewayError::Connection { message } => {
                assert!(message.contains("3 attempts"));
                assert!(message.contains("connect timed out"));
            }
            other => panic!("Expected Connection, got {other:?}"),
        }
    }

    #[test]
    fn auth_maps_to_reauth_required() {
        let err: GatewayError = SchwabError::AuthenticationFailed.into();
        assert!(matches!(err, GatewayError::ReauthRequired));
    }

    #[test]
    fn insufficient_funds_and_market_closed_map_directly() {
        assert!(matches!(
            GatewayError::from(SchwabError::InsufficientFunds),
            GatewayError::InsufficientFunds
        ));
        assert!(matches!(
            GatewayError::from(SchwabError::MarketClosed),
            GatewayError::MarketClosed
        ));
    }

    #[test]
    fn rejection_maps_to_invalid_order() {
        let err: GatewayError = SchwabError::OrderRejected("bad quantity".to_string()).into();
        assert!(matches!(err, GatewayError::InvalidOrder { .. }));
    }
}
