//! HTTP client for the Schwab Trader API.
//!
//! Owns the retry/backoff/error-classification policy and the transparent
//! credential refresh: a 401/403 triggers exactly one invalidate-and-retry
//! through the credential provider before `AuthenticationFailed` surfaces.

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::application::ports::{BrokerProvider, CredentialError, CredentialProvider};
use crate::domain::shared::UserId;
use crate::infrastructure::broker::retry::{
    BackoffCalculator, ErrorCategory, categorize_status, parse_retry_after,
};

use super::api_types::SchwabErrorResponse;
use super::config::SchwabGatewayConfig;
use super::error::SchwabError;

/// HTTP client with retry and token-refresh handling.
#[derive(Clone)]
pub struct SchwabHttpClient {
    client: Client,
    base_url: String,
    config: SchwabGatewayConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl SchwabHttpClient {
    /// Create a new client from config.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn new(
        config: SchwabGatewayConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, SchwabError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SchwabError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            config,
            credentials,
        })
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(
        &self,
        user_id: &UserId,
        path: &str,
    ) -> Result<T, SchwabError> {
        self.request(user_id, Method::GET, path, None::<&()>).await
    }

    /// POST a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        user_id: &UserId,
        path: &str,
        body: &B,
    ) -> Result<T, SchwabError> {
        self.request(user_id, Method::POST, path, Some(body)).await
    }

    /// PUT a JSON body (order replace).
    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        user_id: &UserId,
        path: &str,
        body: &B,
    ) -> Result<T, SchwabError> {
        self.request(user_id, Method::PUT, path, Some(body)).await
    }

    /// DELETE a resource (order cancel).
    pub async fn delete(&self, user_id: &UserId, path: &str) -> Result<(), SchwabError> {
        let _: serde_json::Value = self
            .request(user_id, Method::DELETE, path, None::<&()>)
            .await?;
        Ok(())
    }

    async fn bearer(&self, user_id: &UserId) -> Result<String, SchwabError> {
        match self
            .credentials
            .get_valid_credential(user_id, BrokerProvider::Schwab)
            .await
        {
            Ok(token) => Ok(token.expose().to_string()),
            Err(CredentialError::ReauthRequired { .. }) => Err(SchwabError::AuthenticationFailed),
            Err(CredentialError::Unavailable { message }) => Err(SchwabError::Http(message)),
        }
    }

    async fn request<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        user_id: &UserId,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, SchwabError> {
        let url = format!("{}{path}", self.base_url);
        let mut backoff = BackoffCalculator::new(&self.config.retry);
        let mut refreshed = false;
        let mut last_error = String::new();

        loop {
            let token = self.bearer(user_id).await?;

            let mut request = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(&token);
            if let Some(b) = body {
                request = request.json(b);
            }

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    // Timeouts are retryable connection errors, never
                    // assumed successful.
                    last_error = e.to_string();
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            error = %last_error,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempts(),
                            "Network error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(SchwabError::MaxRetriesExceeded {
                        attempts: backoff.attempts(),
                        last_error,
                    });
                }
            };

            let status = response.status();

            if status.is_success() {
                let text = response
                    .text()
                    .await
                    .map_err(|e| SchwabError::Http(e.to_string()))?;
                if text.is_empty() {
                    return serde_json::from_str("null")
                        .map_err(|e| SchwabError::JsonParse(e.to_string()));
                }
                return serde_json::from_str(&text)
                    .map_err(|e| SchwabError::JsonParse(e.to_string()));
            }

            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);

            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<SchwabErrorResponse>(&error_body)
                .map_or_else(|_| error_body.clone(), |e| e.message_or(&error_body));

            match categorize_status(status.as_u16()) {
                ErrorCategory::Auth => {
                    // Exactly one transparent refresh, then surface.
                    if refreshed {
                        return Err(SchwabError::AuthenticationFailed);
                    }
                    refreshed = true;
                    tracing::info!(user_id = %user_id, "Token rejected; refreshing credential once");
                    self.credentials
                        .invalidate(user_id, BrokerProvider::Schwab)
                        .await;
                }
                ErrorCategory::RateLimited => {
                    // Retry-After drives the delay but the attempt budget
                    // still bounds the loop.
                    let Some(fallback) = backoff.next_backoff() else {
                        return Err(SchwabError::RateLimited {
                            retry_after_secs: retry_after.map(|d| d.as_secs()),
                        });
                    };
                    let delay = retry_after.unwrap_or(fallback);
                    tracing::warn!(
                        delay_ms = delay.as_millis(),
                        "Rate limited by broker, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                ErrorCategory::Retryable => {
                    last_error = format!("{}: {message}", status.as_u16());
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            status = status.as_u16(),
                            message = %message,
                            delay_ms = delay.as_millis(),
                            "Retryable broker error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        return Err(SchwabError::MaxRetriesExceeded {
                            attempts: backoff.attempts(),
                            last_error,
                        });
                    }
                }
                ErrorCategory::NonRetryable => {
                    return Err(classify_rejection(status, path, &message));
                }
            }
        }
    }
}

/// Map a non-retryable status to the adapter taxonomy.
fn classify_rejection(status: StatusCode, path: &str, message: &str) -> SchwabError {
    let lower = message.to_lowercase();
    match status {
        StatusCode::NOT_FOUND => SchwabError::OrderNotFound {
            order_id: path.to_string(),
        },
        StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => {
            if lower.contains("insufficient") {
                SchwabError::InsufficientFunds
            } else if lower.contains("market") && lower.contains("closed") {
                SchwabError::MarketClosed
            } else {
                SchwabError::OrderRejected(message.to_string())
            }
        }
        _ => SchwabError::Api {
            status: status.as_u16(),
            message: message.to_string(),
        },
    }
}
