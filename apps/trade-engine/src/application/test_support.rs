//! Shared test doubles for use-case tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{
    BrokerOrder, BrokerOrderGateway, GatewayError, PortfolioSource, ReplaceTerms,
    RiskConfigSource, RiskDataError,
};
use crate::domain::risk_management::{PortfolioSnapshot, RiskLimitConfig};
use crate::domain::shared::{AccountId, BrokerOrderId, Timestamp, UserId};
use crate::domain::trade_lifecycle::value_objects::FillEvent;

/// Recording broker gateway with scriptable results.
#[derive(Default)]
pub struct RecordingGateway {
    /// Orders placed, in order.
    pub placed: Mutex<Vec<BrokerOrder>>,
    /// Broker order ids cancelled, in order.
    pub cancelled: Mutex<Vec<BrokerOrderId>>,
    place_results: Mutex<VecDeque<Result<BrokerOrderId, GatewayError>>>,
    cancel_results: Mutex<VecDeque<Result<(), GatewayError>>>,
    executions: Mutex<HashMap<String, Vec<FillEvent>>>,
    replace_results: Mutex<VecDeque<Result<BrokerOrderId, GatewayError>>>,
}

impl RecordingGateway {
    /// Create a gateway that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next place result.
    pub fn push_place_result(&self, result: Result<BrokerOrderId, GatewayError>) {
        self.place_results.lock().unwrap().push_back(result);
    }

    /// Script the next cancel result.
    pub fn push_cancel_result(&self, result: Result<(), GatewayError>) {
        self.cancel_results.lock().unwrap().push_back(result);
    }

    /// Script the next replace result.
    pub fn push_replace_result(&self, result: Result<BrokerOrderId, GatewayError>) {
        self.replace_results.lock().unwrap().push_back(result);
    }

    /// Set the executions returned for a broker order id.
    pub fn set_executions(&self, broker_order_id: &str, events: Vec<FillEvent>) {
        self.executions
            .lock()
            .unwrap()
            .insert(broker_order_id.to_string(), events);
    }

    /// Number of orders placed.
    pub fn place_count(&self) -> usize {
        self.placed.lock().unwrap().len()
    }
}

#[async_trait]
impl BrokerOrderGateway for RecordingGateway {
    async fn place(&self, order: &BrokerOrder) -> Result<BrokerOrderId, GatewayError> {
        // Failed placements are still attempts; record them all.
        self.placed.lock().unwrap().push(order.clone());
        self.place_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BrokerOrderId::generate()))
    }

    async fn cancel(
        &self,
        _user_id: &UserId,
        _account_id: &AccountId,
        broker_order_id: &BrokerOrderId,
    ) -> Result<(), GatewayError> {
        let result = self
            .cancel_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()));
        if result.is_ok() {
            self.cancelled.lock().unwrap().push(broker_order_id.clone());
        }
        result
    }

    async fn replace(
        &self,
        _user_id: &UserId,
        _account_id: &AccountId,
        _broker_order_id: &BrokerOrderId,
        _terms: &ReplaceTerms,
    ) -> Result<BrokerOrderId, GatewayError> {
        self.replace_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BrokerOrderId::generate()))
    }

    async fn get_executions(
        &self,
        _user_id: &UserId,
        _account_id: &AccountId,
        broker_order_id: &BrokerOrderId,
    ) -> Result<Vec<FillEvent>, GatewayError> {
        Ok(self
            .executions
            .lock()
            .unwrap()
            .get(broker_order_id.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

/// Risk config source returning one configured answer.
pub struct StaticRiskConfig(pub Option<RiskLimitConfig>);

#[async_trait]
impl RiskConfigSource for StaticRiskConfig {
    async fn limits_for(&self, user_id: &UserId) -> Result<RiskLimitConfig, RiskDataError> {
        self.0.clone().ok_or_else(|| RiskDataError::NotConfigured {
            user_id: user_id.as_str().to_string(),
        })
    }
}

/// Portfolio source returning a fresh copy of one snapshot.
pub struct StaticPortfolio(pub Option<PortfolioSnapshot>);

#[async_trait]
impl PortfolioSource for StaticPortfolio {
    async fn snapshot_for(&self, _user_id: &UserId) -> Result<PortfolioSnapshot, RiskDataError> {
        self.0
            .as_ref()
            .map(|snapshot| PortfolioSnapshot {
                taken_at: Timestamp::now(),
                ..snapshot.clone()
            })
            .ok_or_else(|| RiskDataError::Unavailable {
                message: "portfolio service down".to_string(),
            })
    }
}
