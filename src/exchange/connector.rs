//! The abstract venue-connector contract.
//!
//! This crate does not speak any venue's actual REST/WebSocket dialect
//! (see spec Non-goals); it specifies the contract every connector must
//! fulfil and normalizes venue formats into the shared domain types.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Order, OrderBook, OrderId, OrderSide, OrderStatus, OrderType, TradeResult, TradingFee};
use crate::error::Error;

/// Connector lifecycle state.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Error(String),
}

/// Request to place a new order. Constructed by the pipeline/executor,
/// consumed by [`VenueConnector::place_order`].
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: f64,
    pub price: Option<f64>,
}

pub type OrderBookCallback = Arc<dyn Fn(OrderBook) + Send + Sync>;
pub type TradeCallback = Arc<dyn Fn(TradeResult) + Send + Sync>;

/// Contract every venue connector fulfils: lifecycle, subscriptions, and
/// the handful of rate-limited REST operations the rest of the system
/// depends on. `place_order` never raises on a venue-side rejection — it
/// returns an `Order` with `OrderStatus::Failed`; only connection-level
/// failures are errors.
#[async_trait]
pub trait VenueConnector: Send + Sync {
    fn exchange_name(&self) -> &str;

    fn state(&self) -> ConnectionState;

    async fn connect(&mut self) -> Result<(), Error>;

    async fn disconnect(&mut self) -> Result<(), Error>;

    async fn subscribe_orderbook(&mut self, symbols: &[String], depth: usize) -> Result<(), Error>;

    async fn subscribe_trades(&mut self, symbols: &[String]) -> Result<(), Error>;

    fn on_orderbook_update(&mut self, callback: OrderBookCallback);

    fn on_trade_update(&mut self, callback: TradeCallback);

    async fn place_order(&mut self, request: OrderRequest) -> Result<Order, Error>;

    async fn cancel_order(&mut self, order_id: &OrderId) -> Result<(), Error>;

    async fn get_order_status(&mut self, order_id: &OrderId) -> Result<OrderStatus, Error>;

    async fn get_balances(&mut self) -> Result<HashMap<String, f64>, Error>;

    /// Falls back to the connector's configured fee schedule if the venue
    /// query fails.
    async fn get_trading_fee(&mut self) -> Result<TradingFee, Error>;

    /// Returns 0 for an unknown asset/network rather than erroring.
    async fn get_withdrawal_fee(&mut self, asset: &str) -> f64;
}
