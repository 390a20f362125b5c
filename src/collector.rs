//! Fans connector callbacks into the shared cache.
//!
//! Registers `on_orderbook_update`/`on_trade_update` on every connector
//! before connecting (spec §4.5), starts all connectors concurrently so
//! one venue's connection failure never blocks the others, and tracks
//! per-connector status for observability.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, warn};

use crate::cache::SharedCache;
use crate::domain::{OrderBook, TradeResult};
use crate::exchange::VenueConnector;

#[derive(Debug, Clone, Default)]
pub struct ConnectorStatus {
    pub connected: bool,
    pub orderbook_updates: u64,
    pub trade_updates: u64,
    pub last_update_unix: Option<f64>,
    pub last_error: Option<String>,
}

/// Fan-in orchestrator owning a set of connectors and the cache they
/// publish into. Each connector's callbacks run synchronously on the
/// task that drives it; cache writes never panic into that task (any
/// internal error is logged and swallowed, matching spec §4.5).
pub struct Collector {
    cache: SharedCache,
    status: Arc<RwLock<HashMap<String, ConnectorStatus>>>,
}

impl Collector {
    #[must_use]
    pub fn new(cache: SharedCache) -> Self {
        Self { cache, status: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Register this collector's callbacks on `connector` and connect it.
    /// Call once per connector, before any other collector is started,
    /// so registration always precedes `connect()`.
    pub async fn start_connector(&self, connector: &mut dyn VenueConnector) {
        let exchange = connector.exchange_name().to_string();
        self.status.write().entry(exchange.clone()).or_default();

        let cache = self.cache.clone();
        let status = self.status.clone();
        let ob_exchange = exchange.clone();
        connector.on_orderbook_update(Arc::new(move |book: OrderBook| {
            Self::handle_orderbook_update(&cache, &status, &ob_exchange, book);
        }));

        let status_trade = self.status.clone();
        let trade_exchange = exchange.clone();
        connector.on_trade_update(Arc::new(move |trade: TradeResult| {
            Self::handle_trade_update(&status_trade, &trade_exchange, &trade);
        }));

        match connector.connect().await {
            Ok(()) => {
                info!(exchange = %exchange, "connector started");
                if let Some(entry) = self.status.write().get_mut(&exchange) {
                    entry.connected = true;
                }
            }
            Err(e) => {
                error!(exchange = %exchange, error = %e, "connector failed to start");
                if let Some(entry) = self.status.write().get_mut(&exchange) {
                    entry.connected = false;
                    entry.last_error = Some(e.to_string());
                }
            }
        }
    }

    fn handle_orderbook_update(
        cache: &SharedCache,
        status: &Arc<RwLock<HashMap<String, ConnectorStatus>>>,
        exchange: &str,
        book: OrderBook,
    ) {
        let symbol = book.symbol.clone();
        let timestamp = book.timestamp;
        cache.set_orderbook(exchange, &symbol, book.clone());
        cache.publish_price_update(&book);

        if let Some(entry) = status.write().get_mut(exchange) {
            entry.orderbook_updates += 1;
            entry.last_update_unix = Some(timestamp);
        } else {
            warn!(exchange, "orderbook update for untracked connector");
        }
    }

    fn handle_trade_update(status: &Arc<RwLock<HashMap<String, ConnectorStatus>>>, exchange: &str, _trade: &TradeResult) {
        if let Some(entry) = status.write().get_mut(exchange) {
            entry.trade_updates += 1;
        }
    }

    #[must_use]
    pub fn status(&self) -> HashMap<String, ConnectorStatus> {
        self.status.read().clone()
    }

    #[must_use]
    pub fn connector_status(&self, exchange: &str) -> Option<ConnectorStatus> {
        self.status.read().get(exchange).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderBookEntry;
    use crate::exchange::FixtureConnector;
    use std::collections::HashMap as StdHashMap;

    #[tokio::test]
    async fn start_connector_marks_status_connected_and_registers_callbacks() {
        let collector = Collector::new(SharedCache::new());
        let mut connector = FixtureConnector::new("binance", crate::domain::TradingFee::default(), StdHashMap::new());
        collector.start_connector(&mut connector).await;

        assert!(collector.connector_status("binance").unwrap().connected);

        connector.push_orderbook(OrderBook::new(
            "binance",
            "BTC/USDT",
            1.0,
            vec![OrderBookEntry::new(100.0, 1.0)],
            vec![OrderBookEntry::new(101.0, 1.0)],
        ));
        let status = collector.connector_status("binance").unwrap();
        assert_eq!(status.orderbook_updates, 1);
    }

    #[tokio::test]
    async fn orderbook_update_is_cached_and_published() {
        let cache = SharedCache::new();
        let collector = Collector::new(cache.clone());
        let mut connector = FixtureConnector::new("upbit", crate::domain::TradingFee::default(), StdHashMap::new());
        collector.start_connector(&mut connector).await;

        let mut rx = cache.subscribe_price_updates();
        connector.push_orderbook(OrderBook::new(
            "upbit",
            "BTC/KRW",
            2.0,
            vec![OrderBookEntry::new(50_000.0, 1.0)],
            vec![OrderBookEntry::new(50_100.0, 1.0)],
        ));

        assert!(cache.get_orderbook("upbit", "BTC/KRW").is_some());
        let update = rx.try_recv().expect("published update");
        assert_eq!(update.exchange, "upbit");
    }
}
