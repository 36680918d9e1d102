//! Schwab Trader API wire types and payload serialization.
//!
//! The closed `OrderPricing` variants serialize into Schwab's order JSON
//! here; no untyped payloads cross this boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::{BrokerOrder, ReplaceTerms};
use crate::domain::shared::{Money, Quantity, Timestamp};
use crate::domain::trade_lifecycle::value_objects::{FillEvent, OrderPricing, TradeSide};

/// Instrument leg of a Schwab order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchwabInstrument {
    /// Ticker symbol.
    pub symbol: String,
    /// Asset type, e.g. "EQUITY".
    #[serde(rename = "assetType")]
    pub asset_type: String,
}

/// One leg of a Schwab order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchwabOrderLeg {
    /// BUY or SELL.
    pub instruction: String,
    /// Leg quantity.
    pub quantity: Decimal,
    /// Traded instrument.
    pub instrument: SchwabInstrument,
}

/// Order payload for POST/PUT /accounts/{account}/orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabOrderRequest {
    /// MARKET, LIMIT, STOP, or STOP_LIMIT.
    pub order_type: String,
    /// Trading session, e.g. "NORMAL".
    pub session: String,
    /// Order duration, e.g. "DAY".
    pub duration: String,
    /// Strategy type; single-leg orders use "SINGLE".
    pub order_strategy_type: String,
    /// Limit price, when the order type carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Stop trigger price, when the order type carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<String>,
    /// Order legs.
    pub order_leg_collection: Vec<SchwabOrderLeg>,
}

impl SchwabOrderRequest {
    /// Serialize an engine order into Schwab's payload shape.
    #[must_use]
    pub fn from_broker_order(order: &BrokerOrder) -> Self {
        Self::build(
            order.side,
            order.quantity,
            &order.symbol.as_str().to_string(),
            order.pricing,
        )
    }

    /// Payload for a replace request: same shape, new terms.
    #[must_use]
    pub fn from_replace_terms(original: &Self, terms: &ReplaceTerms) -> Self {
        let mut request = original.clone();
        let (order_type, price, stop_price) = pricing_fields(terms.pricing);
        request.order_type = order_type;
        request.price = price;
        request.stop_price = stop_price;
        if let Some(quantity) = terms.quantity {
            for leg in &mut request.order_leg_collection {
                leg.quantity = quantity.amount();
            }
        }
        request
    }

    fn build(side: TradeSide, quantity: Quantity, symbol: &String, pricing: OrderPricing) -> Self {
        let (order_type, price, stop_price) = pricing_fields(pricing);
        Self {
            order_type,
            session: "NORMAL".to_string(),
            duration: "DAY".to_string(),
            order_strategy_type: "SINGLE".to_string(),
            price,
            stop_price,
            order_leg_collection: vec![SchwabOrderLeg {
                instruction: match side {
                    TradeSide::Buy => "BUY".to_string(),
                    TradeSide::Sell => "SELL".to_string(),
                },
                quantity: quantity.amount(),
                instrument: SchwabInstrument {
                    symbol: symbol.clone(),
                    asset_type: "EQUITY".to_string(),
                },
            }],
        }
    }
}

fn pricing_fields(pricing: OrderPricing) -> (String, Option<String>, Option<String>) {
    match pricing {
        OrderPricing::Market => ("MARKET".to_string(), None, None),
        OrderPricing::Limit { limit } => {
            ("LIMIT".to_string(), Some(limit.amount().to_string()), None)
        }
        OrderPricing::Stop { stop } => {
            ("STOP".to_string(), None, Some(stop.amount().to_string()))
        }
        OrderPricing::StopLimit { stop, limit } => (
            "STOP_LIMIT".to_string(),
            Some(limit.amount().to_string()),
            Some(stop.amount().to_string()),
        ),
    }
}

/// Response from order placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabOrderResponse {
    /// Broker-assigned order id.
    pub order_id: String,
    /// Order status string.
    #[serde(default)]
    pub status: Option<String>,
}

/// One execution leg within an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabExecutionLeg {
    /// Leg index.
    pub leg_id: i64,
    /// Quantity executed in this leg.
    pub quantity: Decimal,
    /// Execution price.
    pub price: Decimal,
    /// Execution time (RFC 3339).
    pub time: String,
}

/// One order activity (execution) on an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabOrderActivity {
    /// Activity type; executions are "EXECUTION".
    pub activity_type: String,
    /// Broker's unique id for this activity.
    pub activity_id: String,
    /// Execution legs.
    #[serde(default)]
    pub execution_legs: Vec<SchwabExecutionLeg>,
}

/// Full order detail, including activities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabOrderDetail {
    /// Broker order id.
    pub order_id: String,
    /// Order status string.
    #[serde(default)]
    pub status: Option<String>,
    /// Working order legs.
    #[serde(default)]
    pub order_leg_collection: Vec<SchwabOrderLeg>,
    /// Activities in broker-reported order.
    #[serde(default)]
    pub order_activity_collection: Vec<SchwabOrderActivity>,
}

impl SchwabOrderDetail {
    /// Map execution activities to fill events, in broker-reported order.
    ///
    /// The activity id doubles as the dedup key; the sequence is the
    /// activity's position in the broker-reported collection.
    #[must_use]
    pub fn to_fill_events(&self) -> Vec<FillEvent> {
        let mut events = Vec::new();
        let mut sequence = 0u64;
        for activity in &self.order_activity_collection {
            if activity.activity_type != "EXECUTION" {
                continue;
            }
            for leg in &activity.execution_legs {
                sequence += 1;
                let timestamp = Timestamp::parse(&leg.time).unwrap_or_else(|_| Timestamp::now());
                events.push(FillEvent::new(
                    format!("{}-{}", activity.activity_id, leg.leg_id),
                    sequence,
                    Quantity::new(leg.quantity),
                    Money::new(leg.price),
                    timestamp,
                ));
            }
        }
        events
    }
}

/// Error body returned by the Schwab API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchwabErrorResponse {
    /// Top-level error message.
    #[serde(default)]
    pub message: Option<String>,
    /// Alternate error field.
    #[serde(default)]
    pub error: Option<String>,
}

impl SchwabErrorResponse {
    /// Best-effort human-readable message.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| fallback.to_string())
    }
}
