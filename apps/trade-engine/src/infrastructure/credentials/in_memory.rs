//! In-memory credential store.
//!
//! Holds a chain of bearer tokens per (user, provider): the front token is
//! current, and `invalidate` discards it so the next acquisition returns
//! the refreshed token behind it. An exhausted chain means the user must
//! re-authorize.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::{
    BearerToken, BrokerProvider, CredentialError, CredentialProvider,
};
use crate::domain::shared::UserId;

/// In-memory implementation of `CredentialProvider`.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    tokens: RwLock<HashMap<(String, BrokerProvider), VecDeque<BearerToken>>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a token chain for a user at a provider. The first token is
    /// current; later tokens become current as earlier ones are
    /// invalidated.
    pub async fn seed(
        &self,
        user_id: &UserId,
        provider: BrokerProvider,
        chain: Vec<BearerToken>,
    ) {
        let mut tokens = self.tokens.write().await;
        tokens.insert(
            (user_id.as_str().to_string(), provider),
            chain.into_iter().collect(),
        );
    }

    /// Remaining tokens in a user's chain.
    pub async fn remaining(&self, user_id: &UserId, provider: BrokerProvider) -> usize {
        let tokens = self.tokens.read().await;
        tokens
            .get(&(user_id.as_str().to_string(), provider))
            .map_or(0, VecDeque::len)
    }
}

#[async_trait]
impl CredentialProvider for InMemoryCredentialStore {
    async fn get_valid_credential(
        &self,
        user_id: &UserId,
        provider: BrokerProvider,
    ) -> Result<BearerToken, CredentialError> {
        let tokens = self.tokens.read().await;
        tokens
            .get(&(user_id.as_str().to_string(), provider))
            .and_then(|chain| chain.front().cloned())
            .ok_or_else(|| CredentialError::ReauthRequired {
                user_id: user_id.as_str().to_string(),
                provider,
            })
    }

    async fn invalidate(&self, user_id: &UserId, provider: BrokerProvider) {
        let mut tokens = self.tokens.write().await;
        if let Some(chain) = tokens.get_mut(&(user_id.as_str().to_string(), provider)) {
            chain.pop_front();
        }
    }
}
