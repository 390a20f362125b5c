//! Statistical (cointegrated pairs) arbitrage detection.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Deserialize;

use super::cointegration::{CointegrationAnalyzer, CointegrationResult, ZScoreGenerator, ZScoreSignal};
use crate::domain::{ArbitrageSignalBuilder, ArbitrageStrategy, ArbitrageSignal, TradingFee};
use crate::spread::gross_spread_pct;

const MAX_HISTORY_LEN: usize = 2_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatisticalDetectorConfig {
    pub enabled: bool,
    pub lookback_periods: usize,
    pub entry_zscore: f64,
    pub exit_zscore: f64,
    pub p_value_threshold: f64,
    pub rescan_interval_hours: f64,
    pub min_half_life: f64,
    pub max_half_life: f64,
    pub quantity_usd: f64,
}

impl Default for StatisticalDetectorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lookback_periods: 60,
            entry_zscore: 2.0,
            exit_zscore: 0.5,
            p_value_threshold: 0.05,
            rescan_interval_hours: 24.0,
            min_half_life: 1.0,
            max_half_life: 90.0,
            quantity_usd: 1_000.0,
        }
    }
}

struct QualifiedPair {
    key_a: String,
    key_b: String,
    hedge_ratio: f64,
    p_value: f64,
    half_life: f64,
}

struct State {
    price_history: HashMap<String, Vec<f64>>,
    qualified_pairs: Vec<QualifiedPair>,
    last_scan: Option<Instant>,
}

pub struct StatisticalDetector {
    config: StatisticalDetectorConfig,
    analyzer: Box<dyn CointegrationAnalyzer>,
    zscore_gen: Box<dyn ZScoreGenerator>,
    state: Mutex<State>,
}

impl StatisticalDetector {
    #[must_use]
    pub fn new(
        config: StatisticalDetectorConfig,
        analyzer: Box<dyn CointegrationAnalyzer>,
        zscore_gen: Box<dyn ZScoreGenerator>,
    ) -> Self {
        Self {
            config,
            analyzer,
            zscore_gen,
            state: Mutex::new(State {
                price_history: HashMap::new(),
                qualified_pairs: Vec::new(),
                last_scan: None,
            }),
        }
    }

    /// Append the latest mid price for `exchange:symbol`, bounded to
    /// `MAX_HISTORY_LEN` entries.
    pub fn update_history(&self, key: impl Into<String>, mid_price: f64) {
        if mid_price <= 0.0 {
            return;
        }
        let mut state = self.state.lock();
        let history = state.price_history.entry(key.into()).or_default();
        history.push(mid_price);
        if history.len() > MAX_HISTORY_LEN {
            let excess = history.len() - MAX_HISTORY_LEN;
            history.drain(0..excess);
        }
    }

    /// Rescan and emit signals for every currently-qualified pair.
    /// `fees_by_exchange` supplies taker fees keyed by exchange name.
    pub fn detect(&self, fees_by_exchange: &HashMap<String, TradingFee>) -> Vec<ArbitrageSignal> {
        if !self.config.enabled {
            return Vec::new();
        }

        self.maybe_rescan();

        let state = self.state.lock();
        let mut signals = Vec::new();
        for pair in &state.qualified_pairs {
            let Some(series_a) = state.price_history.get(&pair.key_a) else { continue };
            let Some(series_b) = state.price_history.get(&pair.key_b) else { continue };
            let Some(output) = self.zscore_gen.generate(
                series_a,
                series_b,
                pair.hedge_ratio,
                self.config.lookback_periods,
                self.config.entry_zscore,
                self.config.exit_zscore,
            ) else {
                continue;
            };
            if output.signal != ZScoreSignal::EntryLong && output.signal != ZScoreSignal::EntryShort {
                continue;
            }

            let (buy_key, sell_key, buy_price, sell_price) = match output.signal {
                ZScoreSignal::EntryLong => (
                    &pair.key_a,
                    &pair.key_b,
                    *series_a.last().unwrap_or(&0.0),
                    *series_b.last().unwrap_or(&0.0),
                ),
                _ => (
                    &pair.key_b,
                    &pair.key_a,
                    *series_b.last().unwrap_or(&0.0),
                    *series_a.last().unwrap_or(&0.0),
                ),
            };
            let Some((buy_exchange, buy_symbol)) = split_key(buy_key) else { continue };
            let Some((sell_exchange, _sell_symbol)) = split_key(sell_key) else { continue };

            let buy_fee = fees_by_exchange.get(&buy_exchange).copied().unwrap_or_default();
            let sell_fee = fees_by_exchange.get(&sell_exchange).copied().unwrap_or_default();

            let gross_pct = gross_spread_pct(buy_price, sell_price);
            let net_pct = gross_pct - (buy_fee.taker_pct + sell_fee.taker_pct);
            if net_pct <= 0.0 {
                continue;
            }

            let zscore_ratio = (output.zscore.abs() / self.config.entry_zscore).min(3.0) / 3.0;
            let confidence = (zscore_ratio + (1.0 - pair.p_value)) / 2.0;

            let signal = ArbitrageSignalBuilder::new(
                ArbitrageStrategy::Statistical,
                buy_exchange,
                sell_exchange,
                buy_symbol,
                buy_price,
                sell_price,
                self.config.quantity_usd / buy_price.max(1e-9),
            )
            .gross_spread_pct(gross_pct)
            .net_spread_pct(net_pct)
            .estimated_profit_usd(net_pct / 100.0 * self.config.quantity_usd)
            .confidence(confidence)
            .metadata("hedge_ratio", pair.hedge_ratio)
            .metadata("zscore", output.zscore)
            .metadata("p_value", pair.p_value)
            .metadata("half_life", pair.half_life)
            .build();
            signals.push(signal);
        }
        signals
    }

    fn maybe_rescan(&self) {
        let should_scan = {
            let state = self.state.lock();
            match state.last_scan {
                None => true,
                Some(last) => {
                    last.elapsed() >= Duration::from_secs_f64(self.config.rescan_interval_hours * 3_600.0)
                }
            }
        };
        if !should_scan {
            return;
        }

        let pairs = {
            let state = self.state.lock();
            let keys: Vec<String> = state.price_history.keys().cloned().collect();
            let mut found = Vec::new();
            for i in 0..keys.len() {
                for j in (i + 1)..keys.len() {
                    let series_a = &state.price_history[&keys[i]];
                    let series_b = &state.price_history[&keys[j]];
                    let result = self.analyzer.analyze(series_a, series_b);
                    if self.qualifies(&result) {
                        found.push(QualifiedPair {
                            key_a: keys[i].clone(),
                            key_b: keys[j].clone(),
                            hedge_ratio: result.hedge_ratio,
                            p_value: result.p_value,
                            half_life: result.half_life,
                        });
                    }
                }
            }
            found
        };

        let mut state = self.state.lock();
        state.qualified_pairs = pairs;
        state.last_scan = Some(Instant::now());
    }

    fn qualifies(&self, result: &CointegrationResult) -> bool {
        result.is_cointegrated
            && result.p_value < self.config.p_value_threshold
            && result.half_life >= self.config.min_half_life
            && result.half_life <= self.config.max_half_life
    }
}

fn split_key(key: &str) -> Option<(String, String)> {
    let mut parts = key.splitn(2, ':');
    let exchange = parts.next()?.to_string();
    let symbol = parts.next()?.to_string();
    Some((exchange, symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::cointegration::{OlsCointegrationAnalyzer, RollingZScoreGenerator};

    #[test]
    fn disabled_detector_emits_nothing() {
        let detector = StatisticalDetector::new(
            StatisticalDetectorConfig::default(),
            Box::new(OlsCointegrationAnalyzer::default()),
            Box::new(RollingZScoreGenerator),
        );
        assert!(detector.detect(&HashMap::new()).is_empty());
    }

    #[test]
    fn history_is_bounded() {
        let detector = StatisticalDetector::new(
            StatisticalDetectorConfig::default(),
            Box::new(OlsCointegrationAnalyzer::default()),
            Box::new(RollingZScoreGenerator),
        );
        for i in 0..(MAX_HISTORY_LEN + 50) {
            detector.update_history("binance:BTC/USDT", 100.0 + i as f64);
        }
        let state = detector.state.lock();
        assert_eq!(state.price_history["binance:BTC/USDT"].len(), MAX_HISTORY_LEN);
    }

    #[test]
    fn non_positive_price_is_ignored() {
        let detector = StatisticalDetector::new(
            StatisticalDetectorConfig::default(),
            Box::new(OlsCointegrationAnalyzer::default()),
            Box::new(RollingZScoreGenerator),
        );
        detector.update_history("binance:BTC/USDT", 0.0);
        detector.update_history("binance:BTC/USDT", -5.0);
        let state = detector.state.lock();
        assert!(state.price_history.is_empty());
    }
}
