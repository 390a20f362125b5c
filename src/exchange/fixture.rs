//! A scripted, in-memory connector used for wiring the pipeline and for
//! tests. Stands in for the real per-venue REST/WebSocket clients that
//! are explicitly out of scope (spec Non-goals).

use std::collections::HashMap;

use async_trait::async_trait;

use super::connector::{ConnectionState, OrderBookCallback, OrderRequest, TradeCallback, VenueConnector};
use crate::domain::{Order, OrderId, OrderStatus, TradingFee};
use crate::error::Error;

/// Connector fed by pre-loaded order books rather than a live feed.
/// `push_orderbook` drives the registered callback directly, mimicking
/// what a real connector would do on receipt of a depth update.
pub struct FixtureConnector {
    exchange: String,
    state: ConnectionState,
    fee: TradingFee,
    balances: HashMap<String, f64>,
    orderbook_cb: Option<OrderBookCallback>,
    trade_cb: Option<TradeCallback>,
    next_order_seq: u64,
}

impl FixtureConnector {
    #[must_use]
    pub fn new(exchange: impl Into<String>, fee: TradingFee, balances: HashMap<String, f64>) -> Self {
        Self {
            exchange: exchange.into(),
            state: ConnectionState::Disconnected,
            fee,
            balances,
            orderbook_cb: None,
            trade_cb: None,
            next_order_seq: 0,
        }
    }

    /// Feed an order-book update to the registered callback, as a real
    /// connector would on receipt of a depth frame.
    pub fn push_orderbook(&self, book: crate::domain::OrderBook) {
        if let Some(cb) = &self.orderbook_cb {
            cb(book);
        }
    }

    pub fn push_trade(&self, trade: crate::domain::TradeResult) {
        if let Some(cb) = &self.trade_cb {
            cb(trade);
        }
    }
}

#[async_trait]
impl VenueConnector for FixtureConnector {
    fn exchange_name(&self) -> &str {
        &self.exchange
    }

    fn state(&self) -> ConnectionState {
        self.state.clone()
    }

    async fn connect(&mut self) -> Result<(), Error> {
        self.state = ConnectionState::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    async fn subscribe_orderbook(&mut self, _symbols: &[String], _depth: usize) -> Result<(), Error> {
        Ok(())
    }

    async fn subscribe_trades(&mut self, _symbols: &[String]) -> Result<(), Error> {
        Ok(())
    }

    fn on_orderbook_update(&mut self, callback: OrderBookCallback) {
        self.orderbook_cb = Some(callback);
    }

    fn on_trade_update(&mut self, callback: TradeCallback) {
        self.trade_cb = Some(callback);
    }

    async fn place_order(&mut self, request: OrderRequest) -> Result<Order, Error> {
        self.next_order_seq += 1;
        let id = OrderId::new(format!("{}-{}", self.exchange, self.next_order_seq));
        Ok(Order::new(id, &self.exchange, request.symbol, request.side, request.order_type, request.quantity, request.price, OrderStatus::Filled))
    }

    async fn cancel_order(&mut self, _order_id: &OrderId) -> Result<(), Error> {
        Ok(())
    }

    async fn get_order_status(&mut self, _order_id: &OrderId) -> Result<OrderStatus, Error> {
        Ok(OrderStatus::Filled)
    }

    async fn get_balances(&mut self) -> Result<HashMap<String, f64>, Error> {
        Ok(self.balances.clone())
    }

    async fn get_trading_fee(&mut self) -> Result<TradingFee, Error> {
        Ok(self.fee)
    }

    async fn get_withdrawal_fee(&mut self, _asset: &str) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderBook, OrderBookEntry};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn connect_transitions_to_connected() {
        let mut connector = FixtureConnector::new("binance", TradingFee::default(), HashMap::new());
        assert_eq!(connector.state(), ConnectionState::Disconnected);
        connector.connect().await.unwrap();
        assert_eq!(connector.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn push_orderbook_invokes_registered_callback() {
        let mut connector = FixtureConnector::new("binance", TradingFee::default(), HashMap::new());
        let invoked = Arc::new(AtomicBool::new(false));
        let invoked_clone = invoked.clone();
        connector.on_orderbook_update(Arc::new(move |_book| {
            invoked_clone.store(true, Ordering::SeqCst);
        }));
        connector.push_orderbook(OrderBook::new("binance", "BTC/USDT", 0.0, vec![OrderBookEntry::new(100.0, 1.0)], vec![OrderBookEntry::new(101.0, 1.0)]));
        assert!(invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn place_order_assigns_increasing_ids() {
        let mut connector = FixtureConnector::new("binance", TradingFee::default(), HashMap::new());
        let request = OrderRequest {
            symbol: "BTC/USDT".into(),
            side: crate::domain::OrderSide::Buy,
            order_type: crate::domain::OrderType::Market,
            quantity: 1.0,
            price: None,
        };
        let first = connector.place_order(request.clone()).await.unwrap();
        let second = connector.place_order(request).await.unwrap();
        assert_ne!(first.id, second.id);
    }
}
