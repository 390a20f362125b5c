//! Per-venue symbol and message normalization.
//!
//! Connectors receive venue-specific wire formats; everything above the
//! connector boundary (cache, detectors, risk, executor) only ever sees
//! the unified `BASE/QUOTE` symbol form and the shared [`OrderBook`] /
//! [`TradeResult`] entities.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::domain::{Order, OrderBook, OrderBookEntry, OrderId, OrderSide, OrderStatus, OrderType, TradeResult};

const QUOTE_ASSETS: [&str; 7] = ["USDT", "BUSD", "USDC", "KRW", "BTC", "ETH", "BNB"];

/// Convert an exchange-specific symbol into the unified `BASE/QUOTE` form.
///
/// ```
/// assert_eq!(arbiter_core::exchange::normalize_symbol("binance", "BTCUSDT"), "BTC/USDT");
/// assert_eq!(arbiter_core::exchange::normalize_symbol("upbit", "KRW-BTC"), "BTC/KRW");
/// assert_eq!(arbiter_core::exchange::normalize_symbol("okx", "BTC-USDT"), "BTC/USDT");
/// ```
#[must_use]
pub fn normalize_symbol(exchange: &str, raw_symbol: &str) -> String {
    let exchange_lower = exchange.to_lowercase();

    if exchange_lower == "upbit" {
        let parts: Vec<&str> = raw_symbol.split('-').collect();
        if parts.len() == 2 {
            return format!("{}/{}", parts[1].to_uppercase(), parts[0].to_uppercase());
        }
        return raw_symbol.to_uppercase();
    }

    if matches!(exchange_lower.as_str(), "okx" | "bybit" | "kucoin" | "gate" | "bitget") {
        let parts: Vec<&str> = raw_symbol.split('-').collect();
        if parts.len() == 2 {
            return format!("{}/{}", parts[0].to_uppercase(), parts[1].to_uppercase());
        }
    }

    if let Some((base, quote)) = raw_symbol.split_once('/') {
        return format!("{}/{}", base.to_uppercase(), quote.to_uppercase());
    }

    let upper = raw_symbol.to_uppercase();
    for quote in QUOTE_ASSETS {
        if let Some(base) = upper.strip_suffix(quote) {
            if !base.is_empty() {
                return format!("{base}/{quote}");
            }
        }
    }
    upper
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn entries_from_array(value: Option<&Value>) -> Vec<OrderBookEntry> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|level| {
            let pair = level.as_array()?;
            let price = as_f64(pair.first()?);
            let quantity = as_f64(pair.get(1)?);
            (quantity > 0.0).then(|| OrderBookEntry::new(price, quantity))
        })
        .collect()
}

fn seconds_from_epoch(raw: f64) -> f64 {
    if raw > 1e12 { raw / 1000.0 } else { raw }
}

fn timestamp_from_secs(secs: f64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs as i64, 0).single().unwrap_or_else(Utc::now)
}

/// Normalize a raw order-book payload into the shared [`OrderBook`] shape.
///
/// Understands Binance's `depthUpdate`/partial-depth frames, Upbit's
/// `orderbook_units` frame, and a generic `{bids, asks}` fallback used by
/// most other venues.
#[must_use]
pub fn normalize_orderbook(exchange: &str, raw: &Value) -> OrderBook {
    let exchange_lower = exchange.to_lowercase();

    if exchange_lower == "upbit" {
        if let Some(units) = raw.get("orderbook_units").and_then(Value::as_array) {
            let symbol = normalize_symbol("upbit", raw.get("code").and_then(Value::as_str).unwrap_or(""));
            let timestamp = seconds_from_epoch(as_f64(raw.get("timestamp").unwrap_or(&Value::Null)));
            let mut bids = Vec::new();
            let mut asks = Vec::new();
            for unit in units {
                let bid_qty = as_f64(unit.get("bid_size").unwrap_or(&Value::Null));
                let ask_qty = as_f64(unit.get("ask_size").unwrap_or(&Value::Null));
                if bid_qty > 0.0 {
                    bids.push(OrderBookEntry::new(as_f64(unit.get("bid_price").unwrap_or(&Value::Null)), bid_qty));
                }
                if ask_qty > 0.0 {
                    asks.push(OrderBookEntry::new(as_f64(unit.get("ask_price").unwrap_or(&Value::Null)), ask_qty));
                }
            }
            bids.sort_by(|a, b| b.price.total_cmp(&a.price));
            asks.sort_by(|a, b| a.price.total_cmp(&b.price));
            return OrderBook::new("upbit", symbol, timestamp, bids, asks);
        }
    }

    if exchange_lower == "binance" && raw.get("e").and_then(Value::as_str) == Some("depthUpdate") {
        let symbol = normalize_symbol("binance", raw.get("s").and_then(Value::as_str).unwrap_or(""));
        let timestamp = seconds_from_epoch(as_f64(raw.get("E").unwrap_or(&Value::Null)));
        let mut bids = entries_from_array(raw.get("b"));
        let mut asks = entries_from_array(raw.get("a"));
        bids.sort_by(|a, b| b.price.total_cmp(&a.price));
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        return OrderBook::new("binance", symbol, timestamp, bids, asks);
    }

    let raw_symbol = raw
        .get("symbol")
        .or_else(|| raw.get("s"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let symbol = if raw_symbol.is_empty() { String::new() } else { normalize_symbol(exchange, raw_symbol) };
    let raw_ts = raw
        .get("timestamp")
        .or_else(|| raw.get("ts"))
        .or_else(|| raw.get("E"))
        .or_else(|| raw.get("lastUpdateId"))
        .map_or(0.0, as_f64);
    let timestamp = seconds_from_epoch(raw_ts);
    let mut bids = entries_from_array(raw.get("bids").or_else(|| raw.get("b")));
    let mut asks = entries_from_array(raw.get("asks").or_else(|| raw.get("a")));
    bids.sort_by(|a, b| b.price.total_cmp(&a.price));
    asks.sort_by(|a, b| a.price.total_cmp(&b.price));
    OrderBook::new(exchange_lower, symbol, timestamp, bids, asks)
}

/// Normalize a raw trade payload into the shared [`TradeResult`] shape.
/// Fee fields are always zero: venue trade streams report fills, not the
/// fee actually charged, so the executor computes fees itself.
#[must_use]
pub fn normalize_trade(exchange: &str, raw: &Value) -> TradeResult {
    let exchange_lower = exchange.to_lowercase();

    if exchange_lower == "upbit" && raw.get("trade_price").is_some() {
        let symbol = normalize_symbol("upbit", raw.get("code").and_then(Value::as_str).unwrap_or(""));
        let price = as_f64(raw.get("trade_price").unwrap_or(&Value::Null));
        let quantity = as_f64(raw.get("trade_volume").unwrap_or(&Value::Null));
        let side = match raw.get("ask_bid").and_then(Value::as_str).unwrap_or("").to_uppercase().as_str() {
            "ASK" => OrderSide::Sell,
            _ => OrderSide::Buy,
        };
        let ts = seconds_from_epoch(as_f64(raw.get("trade_timestamp").unwrap_or(&Value::Null)));
        let id = raw.get("sequential_id").map_or_else(String::new, |v| v.to_string());
        return trade_result("upbit", id, symbol, side, price, quantity, ts);
    }

    if exchange_lower == "binance" && raw.get("e").and_then(Value::as_str) == Some("trade") {
        let symbol = normalize_symbol("binance", raw.get("s").and_then(Value::as_str).unwrap_or(""));
        let price = as_f64(raw.get("p").unwrap_or(&Value::Null));
        let quantity = as_f64(raw.get("q").unwrap_or(&Value::Null));
        let is_buyer_maker = raw.get("m").and_then(Value::as_bool).unwrap_or(false);
        let side = if is_buyer_maker { OrderSide::Sell } else { OrderSide::Buy };
        let ts = seconds_from_epoch(as_f64(raw.get("T").unwrap_or(&Value::Null)));
        let id = raw.get("t").map_or_else(String::new, |v| v.to_string());
        return trade_result("binance", id, symbol, side, price, quantity, ts);
    }

    let raw_symbol = raw
        .get("symbol")
        .or_else(|| raw.get("s"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let symbol = if raw_symbol.is_empty() { String::new() } else { normalize_symbol(exchange, raw_symbol) };
    let price = as_f64(raw.get("price").or_else(|| raw.get("p")).unwrap_or(&Value::Null));
    let quantity =
        as_f64(raw.get("amount").or_else(|| raw.get("q")).or_else(|| raw.get("quantity")).unwrap_or(&Value::Null));
    let side = match raw.get("side").and_then(Value::as_str).unwrap_or("buy").to_uppercase().as_str() {
        "SELL" => OrderSide::Sell,
        _ => OrderSide::Buy,
    };
    let raw_ts = raw.get("timestamp").or_else(|| raw.get("ts")).or_else(|| raw.get("T")).map_or(0.0, as_f64);
    let ts = seconds_from_epoch(raw_ts);
    let id = raw.get("id").or_else(|| raw.get("t")).map_or_else(String::new, |v| v.to_string());
    trade_result(&exchange_lower, id, symbol, side, price, quantity, ts)
}

#[allow(clippy::too_many_arguments)]
fn trade_result(exchange: &str, id: String, symbol: String, side: OrderSide, price: f64, quantity: f64, ts: f64) -> TradeResult {
    let order =
        Order::new(OrderId::new(id), exchange, symbol, side, OrderType::Market, quantity, Some(price), OrderStatus::Filled);
    TradeResult::new(order, quantity, price, 0.0, "", 0.0, timestamp_from_secs(ts))
}
