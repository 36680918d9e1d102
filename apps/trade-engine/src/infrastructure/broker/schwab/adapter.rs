//! Schwab broker adapter implementing `BrokerOrderGateway`.

use async_trait::async_trait;

use crate::application::ports::{
    BrokerOrder, BrokerOrderGateway, CredentialProvider, GatewayError, ReplaceTerms,
};
use crate::domain::shared::{AccountId, BrokerOrderId, UserId};
use crate::domain::trade_lifecycle::value_objects::FillEvent;

use super::api_types::{SchwabOrderDetail, SchwabOrderRequest, SchwabOrderResponse};
use super::config::SchwabGatewayConfig;
use super::error::SchwabError;
use super::http_client::SchwabHttpClient;

/// Schwab Trader API gateway.
#[derive(Clone)]
pub struct SchwabBrokerGateway {
    client: SchwabHttpClient,
    live: bool,
}

impl SchwabBrokerGateway {
    /// Create a new Schwab gateway.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        config: SchwabGatewayConfig,
        credentials: std::sync::Arc<dyn CredentialProvider>,
    ) -> Result<Self, SchwabError> {
        let live = config.environment.is_live();
        let client = SchwabHttpClient::new(config, credentials)?;
        Ok(Self { client, live })
    }

    /// True when pointed at live trading.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.live
    }
}

#[async_trait]
impl BrokerOrderGateway for SchwabBrokerGateway {
    async fn place(&self, order: &BrokerOrder) -> Result<BrokerOrderId, GatewayError> {
        if self.live {
            tracing::warn!(
                trade_id = %order.trade_id,
                symbol = %order.symbol,
                "Submitting LIVE order - this will execute real trades"
            );
        }

        let payload = SchwabOrderRequest::from_broker_order(order);

        tracing::info!(
            trade_id = %order.trade_id,
            symbol = %order.symbol,
            side = %order.side,
            quantity = %order.quantity,
            order_type = %payload.order_type,
            "Placing order at Schwab"
        );

        let response: SchwabOrderResponse = self
            .client
            .post(
                &order.user_id,
                &format!("/accounts/{}/orders", order.account_id),
                &payload,
            )
            .await
            .map_err(GatewayError::from)?;

        tracing::info!(
            trade_id = %order.trade_id,
            broker_order_id = %response.order_id,
            status = ?response.status,
            "Order accepted by broker"
        );

        Ok(BrokerOrderId::new(response.order_id))
    }

    async fn cancel(
        &self,
        user_id: &UserId,
        account_id: &AccountId,
        broker_order_id: &BrokerOrderId,
    ) -> Result<(), GatewayError> {
        tracing::info!(broker_order_id = %broker_order_id, "Cancelling order at Schwab");
        self.client
            .delete(
                user_id,
                &format!("/accounts/{account_id}/orders/{broker_order_id}"),
            )
            .await
            .map_err(GatewayError::from)
    }

    async fn replace(
        &self,
        user_id: &UserId,
        account_id: &AccountId,
        broker_order_id: &BrokerOrderId,
        terms: &ReplaceTerms,
    ) -> Result<BrokerOrderId, GatewayError> {
        // Fetch the working order so the replacement keeps its legs.
        let detail: SchwabOrderDetail = self
            .client
            .get(
                user_id,
                &format!("/accounts/{account_id}/orders/{broker_order_id}"),
            )
            .await
            .map_err(GatewayError::from)?;

        // Replacement keeps the working order's legs; terms override
        // pricing (and quantity when resized).
        let original = SchwabOrderRequest {
            order_type: "LIMIT".to_string(),
            session: "NORMAL".to_string(),
            duration: "DAY".to_string(),
            order_strategy_type: "SINGLE".to_string(),
            price: None,
            stop_price: None,
            order_leg_collection: detail.order_leg_collection.clone(),
        };
        let payload = SchwabOrderRequest::from_replace_terms(&original, terms);

        tracing::info!(
            broker_order_id = %broker_order_id,
            order_type = %payload.order_type,
            "Replacing order at Schwab"
        );

        let response: SchwabOrderResponse = self
            .client
            .put(
                user_id,
                &format!("/accounts/{account_id}/orders/{broker_order_id}"),
                &payload,
            )
            .await
            .map_err(GatewayError::from)?;

        Ok(BrokerOrderId::new(response.order_id))
    }

    async fn get_executions(
        &self,
        user_id: &UserId,
        account_id: &AccountId,
        broker_order_id: &BrokerOrderId,
    ) -> Result<Vec<FillEvent>, GatewayError> {
        let detail: SchwabOrderDetail = self
            .client
            .get(
                user_id,
                &format!("/accounts/{account_id}/orders/{broker_order_id}"),
            )
            .await
            .map_err(GatewayError::from)?;

        Ok(detail.to_fill_events())
    }
}
