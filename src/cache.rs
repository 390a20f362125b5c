//! In-process shared order-book cache and price-update pub/sub.
//!
//! The real deployment target for this contract is Redis (`ob:{exchange}:
//! {symbol}` keys, a `price_updates` channel); that transport is out of
//! scope here, but the contract is fully implemented over `dashmap` plus
//! a `tokio::sync::broadcast` channel so it is testable without a broker.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::domain::OrderBook;

const ORDERBOOK_TTL: Duration = Duration::from_secs(30);
const BALANCE_TTL: Duration = Duration::from_secs(300);
const PRICE_UPDATES_CHANNEL_CAPACITY: usize = 1_024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub exchange: String,
    pub symbol: String,
    pub timestamp: f64,
    pub best_bid: f64,
    pub best_ask: f64,
    pub mid_price: f64,
    pub spread_pct: f64,
}

struct CachedOrderBook {
    book: OrderBook,
    inserted_at: Instant,
}

/// Concurrent order-book cache with TTL-based expiry, and a broadcast
/// channel for `price_updates`. Cheap to clone and share across tasks:
/// internal state is `Arc`-backed by `DashMap`/`broadcast::Sender`.
#[derive(Clone)]
pub struct SharedCache {
    orderbooks: std::sync::Arc<DashMap<String, CachedOrderBook>>,
    price_updates_tx: broadcast::Sender<PriceUpdate>,
}

impl SharedCache {
    #[must_use]
    pub fn new() -> Self {
        let (price_updates_tx, _rx) = broadcast::channel(PRICE_UPDATES_CHANNEL_CAPACITY);
        Self { orderbooks: std::sync::Arc::new(DashMap::new()), price_updates_tx }
    }

    fn key(exchange: &str, symbol: &str) -> String {
        format!("ob:{exchange}:{symbol}")
    }

    /// Store a snapshot, timestamped now for TTL purposes. Never mutates
    /// an existing entry in place; this simply replaces it.
    pub fn set_orderbook(&self, exchange: &str, symbol: &str, book: OrderBook) {
        self.orderbooks
            .insert(Self::key(exchange, symbol), CachedOrderBook { book, inserted_at: Instant::now() });
    }

    /// Returns a cloned snapshot if present and not expired.
    #[must_use]
    pub fn get_orderbook(&self, exchange: &str, symbol: &str) -> Option<OrderBook> {
        let entry = self.orderbooks.get(&Self::key(exchange, symbol))?;
        if entry.inserted_at.elapsed() > ORDERBOOK_TTL {
            return None;
        }
        Some(entry.book.clone())
    }

    /// All cached, non-expired books for `symbol`, keyed by exchange.
    #[must_use]
    pub fn get_all_orderbooks(&self, symbol: &str) -> std::collections::HashMap<String, OrderBook> {
        let suffix = format!(":{symbol}");
        let mut result = std::collections::HashMap::new();
        let mut expired_keys = Vec::new();
        for entry in self.orderbooks.iter() {
            if !entry.key().ends_with(&suffix) {
                continue;
            }
            if entry.value().inserted_at.elapsed() > ORDERBOOK_TTL {
                expired_keys.push(entry.key().clone());
                continue;
            }
            if let Some(exchange) = exchange_from_key(entry.key()) {
                result.insert(exchange, entry.value().book.clone());
            }
        }
        for key in expired_keys {
            self.orderbooks.remove(&key);
        }
        result
    }

    pub fn publish_price_update(&self, book: &OrderBook) {
        let update = PriceUpdate {
            exchange: book.exchange.clone(),
            symbol: book.symbol.clone(),
            timestamp: book.timestamp,
            best_bid: book.best_bid().map(|e| e.price).unwrap_or(0.0),
            best_ask: book.best_ask().map(|e| e.price).unwrap_or(0.0),
            mid_price: book.mid_price(),
            spread_pct: book.spread_pct(),
        };
        // No subscribers is not an error: the update is simply dropped.
        let _ = self.price_updates_tx.send(update);
    }

    #[must_use]
    pub fn subscribe_price_updates(&self) -> broadcast::Receiver<PriceUpdate> {
        self.price_updates_tx.subscribe()
    }
}

impl Default for SharedCache {
    fn default() -> Self {
        Self::new()
    }
}

fn exchange_from_key(key: &str) -> Option<String> {
    // "ob:{exchange}:{symbol}" -> exchange
    let rest = key.strip_prefix("ob:")?;
    let (exchange, _symbol) = rest.split_once(':')?;
    Some(exchange.to_string())
}

/// TTL for the `balance:{exchange}` key pattern; balances are not cached
/// by `SharedCache` itself (the executor owns the live balance map), but
/// this constant documents the contract for anything that snapshots it
/// into the shared store.
#[must_use]
pub fn balance_cache_ttl() -> Duration {
    BALANCE_TTL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderBookEntry;

    fn book(exchange: &str) -> OrderBook {
        OrderBook::new(exchange, "BTC/USDT", 0.0, vec![OrderBookEntry::new(100.0, 1.0)], vec![OrderBookEntry::new(101.0, 1.0)])
    }

    #[test]
    fn set_then_get_returns_a_clone() {
        let cache = SharedCache::new();
        cache.set_orderbook("binance", "BTC/USDT", book("binance"));
        let fetched = cache.get_orderbook("binance", "BTC/USDT").expect("present");
        assert_eq!(fetched.exchange, "binance");
    }

    #[test]
    fn get_all_orderbooks_scans_by_symbol_across_exchanges() {
        let cache = SharedCache::new();
        cache.set_orderbook("binance", "BTC/USDT", book("binance"));
        cache.set_orderbook("upbit", "BTC/USDT", book("upbit"));
        cache.set_orderbook("binance", "ETH/USDT", book("binance"));
        let all = cache.get_all_orderbooks("BTC/USDT");
        assert_eq!(all.len(), 2);
        assert!(all.contains_key("binance"));
        assert!(all.contains_key("upbit"));
    }

    #[tokio::test]
    async fn publish_delivers_to_subscriber() {
        let cache = SharedCache::new();
        let mut rx = cache.subscribe_price_updates();
        cache.publish_price_update(&book("binance"));
        let update = rx.recv().await.expect("update delivered");
        assert_eq!(update.exchange, "binance");
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let cache = SharedCache::new();
        cache.publish_price_update(&book("binance"));
    }
}
