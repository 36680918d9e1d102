//! HTTP-level tests for the Schwab gateway: retry, backoff bounds, token
//! refresh, and error classification against a mock broker.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trade_engine::application::ports::{BrokerOrder, BrokerOrderGateway, GatewayError};
use trade_engine::infrastructure::broker::retry::RetryPolicy;
use trade_engine::{
    AccountId, BearerToken, BrokerOrderId, BrokerProvider, InMemoryCredentialStore, Money,
    OrderPricing, Quantity, SchwabBrokerGateway, SchwabGatewayConfig, Symbol, TradeId, TradeSide,
    UserId,
};

fn fast_retry_config(base_url: &str) -> SchwabGatewayConfig {
    let mut config = SchwabGatewayConfig::paper(base_url);
    config.timeout = Duration::from_secs(5);
    config.retry = RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(10),
        backoff_multiplier: 2.0,
        jitter_factor: 0.0,
    };
    config
}

async fn gateway_with_tokens(
    server: &MockServer,
    tokens: Vec<&str>,
) -> (SchwabBrokerGateway, Arc<InMemoryCredentialStore>) {
    let credentials = Arc::new(InMemoryCredentialStore::new());
    credentials
        .seed(
            &UserId::new("user-1"),
            BrokerProvider::Schwab,
            tokens.into_iter().map(BearerToken::new).collect(),
        )
        .await;

    let gateway = SchwabBrokerGateway::new(fast_retry_config(&server.uri()), credentials.clone())
        .expect("gateway builds");
    (gateway, credentials)
}

fn market_order() -> BrokerOrder {
    BrokerOrder {
        trade_id: TradeId::new("trd-1"),
        user_id: UserId::new("user-1"),
        account_id: AccountId::new("acct-hash"),
        symbol: Symbol::new("AAPL"),
        side: TradeSide::Buy,
        quantity: Quantity::from_i64(100),
        pricing: OrderPricing::Market,
    }
}

#[tokio::test]
async fn place_sends_payload_and_returns_broker_id() {
    let server = MockServer::start().await;
    let (gateway, _) = gateway_with_tokens(&server, vec!["tok-1"]).await;

    Mock::given(method("POST"))
        .and(path("/accounts/acct-hash/orders"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"orderId": "sch-123", "status": "WORKING"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let broker_id = gateway.place(&market_order()).await.unwrap();
    assert_eq!(broker_id.as_str(), "sch-123");
}

#[tokio::test]
async fn expired_token_refreshes_once_transparently() {
    let server = MockServer::start().await;
    let (gateway, credentials) = gateway_with_tokens(&server, vec!["stale", "fresh"]).await;

    // The stale token is rejected; the refreshed one succeeds.
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"orderId": "sch-456"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let broker_id = gateway.place(&market_order()).await.unwrap();
    assert_eq!(broker_id.as_str(), "sch-456");

    // The stale token was invalidated.
    assert_eq!(
        credentials
            .remaining(&UserId::new("user-1"), BrokerProvider::Schwab)
            .await,
        1
    );
}

#[tokio::test]
async fn persistent_auth_failure_surfaces_reauth_required() {
    let server = MockServer::start().await;
    let (gateway, _) = gateway_with_tokens(&server, vec!["bad-1", "bad-2"]).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let err = gateway.place(&market_order()).await.unwrap_err();
    assert!(matches!(err, GatewayError::ReauthRequired));
}

#[tokio::test]
async fn rate_limit_honors_retry_after_then_succeeds() {
    let server = MockServer::start().await;
    let (gateway, _) = gateway_with_tokens(&server, vec!["tok-1"]).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"orderId": "sch-789"})),
        )
        .mount(&server)
        .await;

    let broker_id = gateway.place(&market_order()).await.unwrap();
    assert_eq!(broker_id.as_str(), "sch-789");
}

#[tokio::test]
async fn server_errors_exhaust_bounded_retries() {
    let server = MockServer::start().await;
    let (gateway, _) = gateway_with_tokens(&server, vec!["tok-1"]).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = gateway.place(&market_order()).await.unwrap_err();
    match err {
        GatewayError::Connection { message } => {
            assert!(message.contains("max retries exceeded after 3 attempts"));
            assert!(message.contains("503"));
        }
        other => panic!("Expected Connection error, got {other:?}"),
    }
}

#[tokio::test]
async fn insufficient_funds_is_classified() {
    let server = MockServer::start().await;
    let (gateway, _) = gateway_with_tokens(&server, vec!["tok-1"]).await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(serde_json::json!({"message": "Insufficient buying power"})),
        )
        .mount(&server)
        .await;

    let err = gateway.place(&market_order()).await.unwrap_err();
    assert!(matches!(err, GatewayError::InsufficientFunds));
}

#[tokio::test]
async fn rejected_order_is_not_retried() {
    let server = MockServer::start().await;
    let (gateway, _) = gateway_with_tokens(&server, vec!["tok-1"]).await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(serde_json::json!({"message": "Quantity below lot size"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway.place(&market_order()).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidOrder { .. }));
}

#[tokio::test]
async fn cancel_deletes_order() {
    let server = MockServer::start().await;
    let (gateway, _) = gateway_with_tokens(&server, vec!["tok-1"]).await;

    Mock::given(method("DELETE"))
        .and(path("/accounts/acct-hash/orders/sch-123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    gateway
        .cancel(
            &UserId::new("user-1"),
            &AccountId::new("acct-hash"),
            &BrokerOrderId::new("sch-123"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn cancel_unknown_order_is_not_found() {
    let server = MockServer::start().await;
    let (gateway, _) = gateway_with_tokens(&server, vec!["tok-1"]).await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = gateway
        .cancel(
            &UserId::new("user-1"),
            &AccountId::new("acct-hash"),
            &BrokerOrderId::new("sch-404"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::OrderNotFound { .. }));
}

#[tokio::test]
async fn get_executions_maps_activities_in_order() {
    let server = MockServer::start().await;
    let (gateway, _) = gateway_with_tokens(&server, vec!["tok-1"]).await;

    Mock::given(method("GET"))
        .and(path("/accounts/acct-hash/orders/sch-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "orderId": "sch-123",
            "status": "FILLED",
            "orderActivityCollection": [
                {
                    "activityType": "EXECUTION",
                    "activityId": "act-1",
                    "executionLegs": [
                        {"legId": 1, "quantity": "60", "price": "10.00", "time": "2026-03-02T14:30:00Z"}
                    ]
                },
                {
                    "activityType": "EXECUTION",
                    "activityId": "act-2",
                    "executionLegs": [
                        {"legId": 1, "quantity": "40", "price": "10.50", "time": "2026-03-02T14:31:00Z"}
                    ]
                }
            ]
        })))
        .mount(&server)
        .await;

    let events = gateway
        .get_executions(
            &UserId::new("user-1"),
            &AccountId::new("acct-hash"),
            &BrokerOrderId::new("sch-123"),
        )
        .await
        .unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].sequence, 1);
    assert_eq!(events[0].quantity, Quantity::from_i64(60));
    assert_eq!(events[0].price, Money::usd(10.00));
    assert_eq!(events[1].sequence, 2);
    assert_eq!(events[1].price, Money::usd(10.50));
}
