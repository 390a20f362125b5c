//! Stateless order-book fill simulation.

use chrono::Utc;
use rand::Rng;

use crate::domain::{
    BookSide, Order, OrderId, OrderSide, OrderStatus, OrderType, OrderBook, TradeResult, TradingFee,
};

/// Walk `side`'s depth in `book`, filling up to `requested_qty` at the
/// resulting VWAP price, and charge the taker fee for the side. BUY fees
/// are charged in the base asset; SELL fees are charged in the quote
/// asset.
#[must_use]
pub fn simulate_fill(
    exchange: &str,
    symbol: &str,
    book: &OrderBook,
    side: OrderSide,
    requested_qty: f64,
    fee: TradingFee,
) -> TradeResult {
    let book_side = match side {
        OrderSide::Buy => BookSide::Asks,
        OrderSide::Sell => BookSide::Bids,
    };
    let (filled_quantity, filled_price) = book.consume_quantity(book_side, requested_qty);

    let status = if filled_quantity <= 0.0 {
        OrderStatus::Failed
    } else if filled_quantity >= requested_qty {
        OrderStatus::Filled
    } else {
        OrderStatus::Partial
    };

    let (fee_amount, fee_asset) = match side {
        OrderSide::Buy => (filled_quantity * fee.taker_pct / 100.0, base_asset(symbol)),
        OrderSide::Sell => (filled_quantity * filled_price * fee.taker_pct / 100.0, quote_asset(symbol)),
    };

    let order = Order::new(
        OrderId::generate(),
        exchange,
        symbol,
        side,
        OrderType::Market,
        requested_qty,
        None,
        status,
    );

    let latency_ms = rand::thread_rng().gen_range(1.0..8.0);

    TradeResult::new(order, filled_quantity, filled_price, fee_amount, fee_asset, latency_ms, Utc::now())
}

fn base_asset(symbol: &str) -> String {
    symbol.split('/').next().unwrap_or(symbol).to_string()
}

fn quote_asset(symbol: &str) -> String {
    symbol.split('/').nth(1).unwrap_or(symbol).to_string()
}
