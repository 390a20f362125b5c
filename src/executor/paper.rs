//! Deterministic paper-trading execution engine.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;

use super::fill_simulator::simulate_fill;
use crate::domain::{
    ArbitrageSignal, AssetBalance, ExchangeBalance, OrderBook, OrderSide, PortfolioSnapshot, TradeResult,
    TradingFee,
};

const MIN_SCALED_ORDER_USD: f64 = 10.0;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("missing orderbook for {0}")]
    MissingOrderBook(String),
    #[error("invalid symbol format: {0}")]
    InvalidSymbol(String),
    #[error("insufficient balance on {exchange} for {asset}: needed {needed}, available {available}")]
    InsufficientBalance { exchange: String, asset: String, needed: f64, available: f64 },
}

pub struct PaperExecutor {
    balances: HashMap<String, HashMap<String, f64>>,
    initial_balances: HashMap<String, HashMap<String, f64>>,
    fees: HashMap<String, TradingFee>,
    orderbooks: HashMap<String, OrderBook>,
    trade_log: Vec<(TradeResult, TradeResult)>,
}

impl PaperExecutor {
    #[must_use]
    pub fn new(initial_balances: HashMap<String, HashMap<String, f64>>, fees: HashMap<String, TradingFee>) -> Self {
        Self {
            balances: initial_balances.clone(),
            initial_balances,
            fees,
            orderbooks: HashMap::new(),
            trade_log: Vec::new(),
        }
    }

    pub fn update_orderbooks(&mut self, updates: HashMap<String, OrderBook>) {
        self.orderbooks.extend(updates);
    }

    /// Execute both legs of `signal`, mutating balances in place.
    /// Invariant: on success no balance goes negative and the trade log
    /// grows by exactly one entry.
    pub fn execute(&mut self, signal: &ArbitrageSignal) -> Result<(TradeResult, TradeResult), ExecutorError> {
        let (base, quote) = split_symbol(&signal.symbol)
            .ok_or_else(|| ExecutorError::InvalidSymbol(signal.symbol.clone()))?;

        let buy_key = format!("{}:{}", signal.buy_exchange, signal.symbol);
        let sell_key = format!("{}:{}", signal.sell_exchange, signal.symbol);
        let buy_book = self.orderbooks.get(&buy_key).ok_or_else(|| ExecutorError::MissingOrderBook(buy_key.clone()))?;
        let sell_book =
            self.orderbooks.get(&sell_key).ok_or_else(|| ExecutorError::MissingOrderBook(sell_key.clone()))?;

        let quote_needed = signal.quantity * signal.buy_price;
        let buy_balance = self.balance_of(&signal.buy_exchange, &quote);
        if buy_balance < quote_needed {
            return Err(ExecutorError::InsufficientBalance {
                exchange: signal.buy_exchange.clone(),
                asset: quote.clone(),
                needed: quote_needed,
                available: buy_balance,
            });
        }

        let sell_balance = self.balance_of(&signal.sell_exchange, &base);
        let mut quantity = signal.quantity;
        if sell_balance < quantity {
            let scaled_notional = sell_balance * signal.buy_price;
            if scaled_notional < MIN_SCALED_ORDER_USD {
                return Err(ExecutorError::InsufficientBalance {
                    exchange: signal.sell_exchange.clone(),
                    asset: base.clone(),
                    needed: quantity,
                    available: sell_balance,
                });
            }
            quantity = sell_balance;
        }

        let buy_fee = self.fees.get(&signal.buy_exchange).copied().unwrap_or_default();
        let sell_fee = self.fees.get(&signal.sell_exchange).copied().unwrap_or_default();

        let buy_result =
            simulate_fill(&signal.buy_exchange, &signal.symbol, buy_book, OrderSide::Buy, quantity, buy_fee);
        let sell_result =
            simulate_fill(&signal.sell_exchange, &signal.symbol, sell_book, OrderSide::Sell, quantity, sell_fee);

        self.apply_buy_delta(&signal.buy_exchange, &base, &quote, &buy_result);
        self.apply_sell_delta(&signal.sell_exchange, &base, &quote, &sell_result);

        self.trade_log.push((buy_result.clone(), sell_result.clone()));
        Ok((buy_result, sell_result))
    }

    fn apply_buy_delta(&mut self, exchange: &str, base: &str, quote: &str, result: &TradeResult) {
        *self.balance_mut(exchange, quote) -= result.filled_quantity * result.filled_price;
        *self.balance_mut(exchange, base) += result.filled_quantity - result.fee;
    }

    fn apply_sell_delta(&mut self, exchange: &str, base: &str, quote: &str, result: &TradeResult) {
        *self.balance_mut(exchange, base) -= result.filled_quantity;
        *self.balance_mut(exchange, quote) += result.filled_quantity * result.filled_price - result.fee;
    }

    fn balance_of(&self, exchange: &str, asset: &str) -> f64 {
        self.balances.get(exchange).and_then(|m| m.get(asset)).copied().unwrap_or(0.0)
    }

    fn balance_mut(&mut self, exchange: &str, asset: &str) -> &mut f64 {
        self.balances.entry(exchange.to_string()).or_default().entry(asset.to_string()).or_insert(0.0)
    }

    #[must_use]
    pub fn get_portfolio(&self) -> PortfolioSnapshot {
        let mut exchange_balances = HashMap::new();
        for (exchange, assets) in &self.balances {
            let mut balances = HashMap::new();
            for (asset, free) in assets {
                balances.insert(asset.clone(), AssetBalance { asset: asset.clone(), free: *free, locked: 0.0, usd_value: None });
            }
            exchange_balances.insert(exchange.clone(), ExchangeBalance { exchange: exchange.clone(), balances });
        }
        PortfolioSnapshot { timestamp: Utc::now(), exchange_balances }
    }

    /// Per-exchange, per-asset delta versus `initial_balances`, dropping
    /// differences smaller than `1e-12`.
    #[must_use]
    pub fn get_pnl(&self) -> HashMap<String, HashMap<String, f64>> {
        let mut pnl = HashMap::new();
        for (exchange, assets) in &self.balances {
            let initial = self.initial_balances.get(exchange);
            let mut deltas = HashMap::new();
            for (asset, current) in assets {
                let start = initial.and_then(|m| m.get(asset)).copied().unwrap_or(0.0);
                let delta = current - start;
                if delta.abs() >= 1e-12 {
                    deltas.insert(asset.clone(), delta);
                }
            }
            if !deltas.is_empty() {
                pnl.insert(exchange.clone(), deltas);
            }
        }
        pnl
    }

    #[must_use]
    pub fn trade_log(&self) -> &[(TradeResult, TradeResult)] {
        &self.trade_log
    }
}

fn split_symbol(symbol: &str) -> Option<(String, String)> {
    let mut parts = symbol.split('/');
    let base = parts.next()?.to_string();
    let quote = parts.next()?.to_string();
    if parts.next().is_some() {
        return None;
    }
    Some((base, quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArbitrageSignalBuilder, ArbitrageStrategy, OrderBookEntry};

    fn executor_with(balances: HashMap<String, HashMap<String, f64>>) -> PaperExecutor {
        let mut executor = PaperExecutor::new(balances, HashMap::new());
        executor.update_orderbooks(HashMap::from([
            (
                "binance:BTC/USDT".to_string(),
                OrderBook::new("binance", "BTC/USDT", 0.0, vec![OrderBookEntry::new(49_990.0, 10.0)], vec![OrderBookEntry::new(50_000.0, 10.0)]),
            ),
            (
                "upbit:BTC/USDT".to_string(),
                OrderBook::new("upbit", "BTC/USDT", 0.0, vec![OrderBookEntry::new(50_300.0, 10.0)], vec![OrderBookEntry::new(50_400.0, 10.0)]),
            ),
        ]));
        executor
    }

    fn seeded_balances() -> HashMap<String, HashMap<String, f64>> {
        HashMap::from([
            ("binance".to_string(), HashMap::from([("USDT".to_string(), 10_000.0), ("BTC".to_string(), 0.0)])),
            ("upbit".to_string(), HashMap::from([("USDT".to_string(), 0.0), ("BTC".to_string(), 1.0)])),
        ])
    }

    fn spatial_signal() -> ArbitrageSignal {
        ArbitrageSignalBuilder::new(ArbitrageStrategy::Spatial, "binance", "upbit", "BTC/USDT", 50_000.0, 50_300.0, 0.02)
            .build()
    }

    #[test]
    fn missing_orderbook_is_an_error() {
        let mut executor = PaperExecutor::new(seeded_balances(), HashMap::new());
        assert!(executor.execute(&spatial_signal()).is_err());
    }

    #[test]
    fn successful_execution_keeps_balances_non_negative_and_logs_one_trade() {
        let mut executor = executor_with(seeded_balances());
        let result = executor.execute(&spatial_signal());
        assert!(result.is_ok());
        assert_eq!(executor.trade_log().len(), 1);
        for assets in executor.balances.values() {
            for &value in assets.values() {
                assert!(value >= 0.0);
            }
        }
    }

    #[test]
    fn insufficient_quote_balance_is_rejected() {
        let mut balances = seeded_balances();
        balances.get_mut("binance").unwrap().insert("USDT".to_string(), 1.0);
        let mut executor = executor_with(balances);
        assert!(executor.execute(&spatial_signal()).is_err());
    }

    #[test]
    fn scales_down_when_base_balance_is_thin_but_above_minimum() {
        let mut balances = seeded_balances();
        balances.get_mut("upbit").unwrap().insert("BTC".to_string(), 0.001);
        let mut executor = executor_with(balances);
        let (_, sell_result) = executor.execute(&spatial_signal()).expect("scaled execution");
        assert!(sell_result.filled_quantity <= 0.001 + 1e-9);
    }

    #[test]
    fn rejects_when_scaled_balance_is_below_minimum() {
        let mut balances = seeded_balances();
        balances.get_mut("upbit").unwrap().insert("BTC".to_string(), 0.0000001);
        let mut executor = executor_with(balances);
        assert!(executor.execute(&spatial_signal()).is_err());
    }

    #[test]
    fn pnl_excludes_near_zero_deltas() {
        let executor = executor_with(seeded_balances());
        let pnl = executor.get_pnl();
        assert!(pnl.is_empty());
    }
}
