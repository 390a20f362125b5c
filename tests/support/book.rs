use arbiter_core::domain::{OrderBook, OrderBookEntry};

/// A single top-of-book level order book: one bid, one ask.
pub fn top_of_book(exchange: &str, symbol: &str, bid: f64, ask: f64, qty: f64) -> OrderBook {
    OrderBook::new(exchange, symbol, 0.0, vec![OrderBookEntry::new(bid, qty)], vec![OrderBookEntry::new(ask, qty)])
}
