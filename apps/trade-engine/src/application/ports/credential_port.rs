//! Credential provider port (driven).
//!
//! OAuth acquisition and refresh mechanics live outside the engine; this
//! port only hands back a currently-valid bearer token or reports that the
//! user must re-authorize.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::UserId;

/// Broker integration a credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerProvider {
    /// Charles Schwab.
    Schwab,
    /// Coinbase.
    Coinbase,
}

impl fmt::Display for BrokerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schwab => write!(f, "schwab"),
            Self::Coinbase => write!(f, "coinbase"),
        }
    }
}

/// An opaque bearer token.
///
/// Debug/Display never print the token value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a token string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the token for an Authorization header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken(***)")
    }
}

/// Credential errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// Refresh failed; the user must re-authorize interactively.
    #[error("Re-authorization required for {user_id} at {provider}")]
    ReauthRequired {
        /// Affected user.
        user_id: String,
        /// Affected provider.
        provider: BrokerProvider,
    },

    /// Credential store could not be reached.
    #[error("Credential store error: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

/// Port for credential access.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Get a currently-valid bearer token for a user at a provider.
    ///
    /// Implementations refresh expired tokens transparently where a refresh
    /// token permits it.
    ///
    /// # Errors
    ///
    /// Returns `ReauthRequired` when no valid token can be produced.
    async fn get_valid_credential(
        &self,
        user_id: &UserId,
        provider: BrokerProvider,
    ) -> Result<BearerToken, CredentialError>;

    /// Invalidate the cached token after a persistent auth failure so the
    /// next acquisition takes the refresh path.
    async fn invalidate(&self, user_id: &UserId, provider: BrokerProvider);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_debug_is_redacted() {
        let token = BearerToken::new("very-secret");
        assert_eq!(format!("{token:?}"), "BearerToken(***)");
        assert_eq!(token.expose(), "very-secret");
    }

    #[test]
    fn provider_display() {
        assert_eq!(format!("{}", BrokerProvider::Schwab), "schwab");
        assert_eq!(format!("{}", BrokerProvider::Coinbase), "coinbase");
    }

    #[test]
    fn credential_error_display() {
        let err = CredentialError::ReauthRequired {
            user_id: "user-1".to_string(),
            provider: BrokerProvider::Schwab,
        };
        let msg = format!("{err}");
        assert!(msg.contains("user-1"));
        assert!(msg.contains("schwab"));
    }
}
