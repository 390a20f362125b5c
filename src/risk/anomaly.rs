//! Per-venue flash-crash, abnormal-spread, and stale-price detection.

use std::collections::{HashMap, VecDeque};

use serde::Deserialize;

use crate::domain::OrderBook;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnomalyDetectorConfig {
    pub flash_crash_pct: f64,
    pub spread_std_threshold: f64,
    pub stale_threshold_seconds: f64,
    pub history_size: usize,
}

impl Default for AnomalyDetectorConfig {
    fn default() -> Self {
        Self {
            flash_crash_pct: 10.0,
            spread_std_threshold: 3.0,
            stale_threshold_seconds: 30.0,
            history_size: 100,
        }
    }
}

#[derive(Default)]
struct SeriesHistory {
    prices: VecDeque<f64>,
    spreads: VecDeque<f64>,
}

pub struct AnomalyDetector {
    config: AnomalyDetectorConfig,
    history: HashMap<String, SeriesHistory>,
}

impl AnomalyDetector {
    #[must_use]
    pub fn new(config: AnomalyDetectorConfig) -> Self {
        Self { config, history: HashMap::new() }
    }

    /// Flash-crash, abnormal-spread, then stale-price checks, in that
    /// order, short-circuiting on the first anomaly found. `now_seconds`
    /// is the caller's current time (seconds since epoch), matching
    /// `OrderBook::timestamp`'s unit.
    #[must_use]
    pub fn check_orderbook(&self, key: &str, book: &OrderBook, now_seconds: f64) -> Result<(), String> {
        let history = self.history.get(key);

        let mid = book.mid_price();
        if let Some(history) = history {
            if mid > 0.0 {
                if let Some(&peak) = history.prices.iter().max_by(|a, b| a.total_cmp(b)) {
                    let drop_pct = (peak - mid) / peak * 100.0;
                    if peak > 0.0 && drop_pct >= self.config.flash_crash_pct {
                        return Err(format!(
                            "flash crash on {key}: {drop_pct:.2}% drop from rolling peak {peak:.4}"
                        ));
                    }
                }
            }

            if history.spreads.len() >= 2 {
                let mean = history.spreads.iter().sum::<f64>() / history.spreads.len() as f64;
                let variance = history.spreads.iter().map(|s| (s - mean).powi(2)).sum::<f64>()
                    / history.spreads.len() as f64;
                let std = variance.sqrt();
                if std > 0.0 {
                    let z = (book.spread_pct() - mean) / std;
                    if z >= self.config.spread_std_threshold {
                        return Err(format!("abnormal spread on {key}: z-score {z:.2}"));
                    }
                }
            }
        }

        if now_seconds - book.timestamp > self.config.stale_threshold_seconds {
            return Err(format!(
                "stale price on {key}: {:.1}s old",
                now_seconds - book.timestamp
            ));
        }

        Ok(())
    }

    /// Append the latest mid price (if positive) and spread to `key`'s
    /// bounded rolling history.
    pub fn update_history(&mut self, key: impl Into<String>, book: &OrderBook) {
        let history = self.history.entry(key.into()).or_default();
        let mid = book.mid_price();
        if mid > 0.0 {
            push_bounded(&mut history.prices, mid, self.config.history_size);
        }
        push_bounded(&mut history.spreads, book.spread_pct(), self.config.history_size);
    }
}

fn push_bounded(deque: &mut VecDeque<f64>, value: f64, max_len: usize) {
    deque.push_back(value);
    while deque.len() > max_len {
        deque.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderBookEntry;

    fn book(bid: f64, ask: f64, timestamp: f64) -> OrderBook {
        OrderBook::new(
            "binance",
            "BTC/USDT",
            timestamp,
            vec![OrderBookEntry::new(bid, 1.0)],
            vec![OrderBookEntry::new(ask, 1.0)],
        )
    }

    #[test]
    fn no_history_means_no_flash_crash_or_spread_anomaly() {
        let detector = AnomalyDetector::new(AnomalyDetectorConfig::default());
        assert!(detector.check_orderbook("binance:BTC/USDT", &book(100.0, 100.0, 0.0), 0.0).is_ok());
    }

    #[test]
    fn flash_crash_detected_against_rolling_peak() {
        let mut detector = AnomalyDetector::new(AnomalyDetectorConfig::default());
        detector.update_history("k", &book(10_000.0, 10_000.0, 0.0));
        detector.update_history("k", &book(10_100.0, 10_100.0, 0.0));
        let result = detector.check_orderbook("k", &book(9_000.0, 9_000.0, 0.0), 0.0);
        assert!(result.is_err());
    }

    #[test]
    fn stale_price_detected() {
        let detector = AnomalyDetector::new(AnomalyDetectorConfig::default());
        let result = detector.check_orderbook("k", &book(100.0, 100.1, 0.0), 1_000.0);
        assert!(result.is_err());
    }

    #[test]
    fn abnormal_spread_requires_two_points_and_nonzero_std() {
        let mut detector = AnomalyDetector::new(AnomalyDetectorConfig::default());
        detector.update_history("k", &book(100.0, 100.1, 0.0));
        // Only one point so far: no spread anomaly possible yet.
        assert!(detector.check_orderbook("k", &book(100.0, 110.0, 0.0), 0.0).is_ok());
    }
}
