//! Cross-venue ("spatial") arbitrage detection.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::{ArbitrageSignalBuilder, ArbitrageStrategy, ArbitrageSignal, OrderBook, TradingFee};
use crate::spread::arbitrage_profit;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpatialDetectorConfig {
    pub enabled: bool,
    pub min_spread_pct: f64,
    pub min_depth_usd: f64,
    pub max_latency_ms: u64,
    pub use_gross_spread: bool,
    pub default_quantity_usd: f64,
}

impl Default for SpatialDetectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_spread_pct: 0.25,
            min_depth_usd: 1_000.0,
            max_latency_ms: 500,
            use_gross_spread: false,
            default_quantity_usd: 1_000.0,
        }
    }
}

pub struct SpatialDetector {
    config: SpatialDetectorConfig,
}

impl SpatialDetector {
    #[must_use]
    pub fn new(config: SpatialDetectorConfig) -> Self {
        Self { config }
    }

    /// Scan every directed pair of the given exchanges' books for `symbol`
    /// and emit one signal per qualifying pair, sorted by `net_spread_pct`
    /// descending.
    pub fn detect(
        &self,
        symbol: &str,
        books_by_exchange: &HashMap<String, OrderBook>,
        fees_by_exchange: &HashMap<String, TradingFee>,
    ) -> Vec<ArbitrageSignal> {
        if !self.config.enabled {
            return Vec::new();
        }

        let notional = self.config.default_quantity_usd;
        let exchanges: Vec<&String> = books_by_exchange.keys().collect();
        let mut signals = Vec::new();

        for &buy_ex in &exchanges {
            for &sell_ex in &exchanges {
                if buy_ex == sell_ex {
                    continue;
                }
                let buy_book = &books_by_exchange[buy_ex];
                let sell_book = &books_by_exchange[sell_ex];
                let buy_fee = fees_by_exchange.get(buy_ex).copied().unwrap_or_default();
                let sell_fee = fees_by_exchange.get(sell_ex).copied().unwrap_or_default();

                let profit = arbitrage_profit(buy_book, sell_book, buy_fee, sell_fee, notional, true);

                let threshold_spread = if self.config.use_gross_spread {
                    profit.gross_pct
                } else {
                    profit.net_pct
                };
                if threshold_spread < self.config.min_spread_pct {
                    continue;
                }
                if profit.available_depth_usd < self.config.min_depth_usd {
                    continue;
                }
                if !self.config.use_gross_spread && profit.estimated_profit_usd <= 0.0 {
                    continue;
                }
                if profit.buy_price <= 0.0 {
                    continue;
                }

                let spread_ratio = (threshold_spread / self.config.min_spread_pct).min(3.0) / 3.0;
                let depth_ratio = (profit.available_depth_usd / notional).min(10.0) / 10.0;
                let confidence = ((spread_ratio + depth_ratio) / 2.0).min(1.0);

                let signal = ArbitrageSignalBuilder::new(
                    ArbitrageStrategy::Spatial,
                    buy_ex.clone(),
                    sell_ex.clone(),
                    symbol.to_string(),
                    profit.buy_price,
                    profit.sell_price,
                    notional / profit.buy_price,
                )
                .gross_spread_pct(profit.gross_pct)
                .net_spread_pct(profit.net_pct)
                .estimated_profit_usd(profit.estimated_profit_usd)
                .confidence(confidence)
                .orderbook_depth_usd(profit.available_depth_usd)
                .metadata("buy_maker", true)
                .metadata("sell_maker", false)
                .build();
                signals.push(signal);
            }
        }

        signals.sort_by(|a, b| {
            b.net_spread_pct
                .partial_cmp(&a.net_spread_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderBookEntry;

    fn book(exchange: &str, bid: f64, ask: f64) -> OrderBook {
        OrderBook::new(
            exchange,
            "BTC/USDT",
            0.0,
            vec![OrderBookEntry::new(bid, 1.0)],
            vec![OrderBookEntry::new(ask, 1.0)],
        )
    }

    #[test]
    fn scenario_one_emits_single_profitable_signal() {
        let mut books = HashMap::new();
        books.insert("binance".to_string(), book("binance", 49_990.0, 50_000.0));
        books.insert("upbit".to_string(), book("upbit", 50_300.0, 50_400.0));

        let mut fees = HashMap::new();
        fees.insert("binance".to_string(), TradingFee::new(0.02, 0.04));
        fees.insert("upbit".to_string(), TradingFee::new(0.02, 0.04));

        let detector = SpatialDetector::new(SpatialDetectorConfig {
            min_spread_pct: 0.25,
            min_depth_usd: 1_000.0,
            default_quantity_usd: 1_000.0,
            ..Default::default()
        });

        let signals = detector.detect("BTC/USDT", &books, &fees);
        assert_eq!(signals.len(), 1);
        let signal = &signals[0];
        assert_eq!(signal.buy_exchange, "binance");
        assert_eq!(signal.sell_exchange, "upbit");
        assert!((signal.net_spread_pct - 0.54).abs() < 0.05);
    }

    #[test]
    fn disabled_detector_emits_nothing() {
        let mut books = HashMap::new();
        books.insert("binance".to_string(), book("binance", 49_990.0, 50_000.0));
        books.insert("upbit".to_string(), book("upbit", 50_300.0, 50_400.0));
        let detector = SpatialDetector::new(SpatialDetectorConfig { enabled: false, ..Default::default() });
        assert!(detector.detect("BTC/USDT", &books, &HashMap::new()).is_empty());
    }

    #[test]
    fn signals_sorted_by_net_spread_descending() {
        let mut books = HashMap::new();
        books.insert("a".to_string(), book("a", 100.0, 100.0));
        books.insert("b".to_string(), book("b", 106.0, 106.0));
        books.insert("c".to_string(), book("c", 120.0, 120.0));
        let detector = SpatialDetector::new(SpatialDetectorConfig {
            min_spread_pct: 0.0,
            min_depth_usd: 0.0,
            use_gross_spread: true,
            default_quantity_usd: 10.0,
            ..Default::default()
        });
        let signals = detector.detect("X/Y", &books, &HashMap::new());
        for pair in signals.windows(2) {
            assert!(pair[0].net_spread_pct >= pair[1].net_spread_pct);
        }
    }
}
