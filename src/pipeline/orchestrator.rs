//! Detect -> risk-gate -> execute orchestration for a single cycle.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::detectors::{SpatialDetector, StatisticalDetector, TriangularDetector};
use crate::domain::{ArbitrageSignal, OrderBook, TradingFee};
use crate::executor::PaperExecutor;
use crate::risk::{RiskDecision, RiskGate};

/// Optional triangular-arbitrage input for one venue: the venue name and
/// its per-symbol order books.
pub struct TriangularInput {
    pub exchange: String,
    pub books_by_symbol: HashMap<String, OrderBook>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub cycles_run: u64,
    pub total_signals_detected: u64,
    pub total_signals_approved: u64,
    pub total_signals_rejected: u64,
    pub total_signals_failed: u64,
    pub total_pnl_usd: f64,
    pub total_fees_usd: f64,
    pub rejection_reasons: HashMap<String, u64>,
}

pub struct ExecutedTrade {
    pub signal: ArbitrageSignal,
    pub buy: crate::domain::TradeResult,
    pub sell: crate::domain::TradeResult,
    pub pnl_usd: f64,
}

/// Owns the detectors, risk gate, and executor for one run of the
/// system, and drives exactly one cycle at a time via [`Self::run_once`].
pub struct Pipeline {
    spatial: SpatialDetector,
    triangular: TriangularDetector,
    statistical: StatisticalDetector,
    risk_gate: RiskGate,
    executor: PaperExecutor,
    fees: HashMap<String, TradingFee>,
    stats: PipelineStats,
    trade_log: Vec<(ArbitrageSignal, crate::domain::TradeResult, crate::domain::TradeResult)>,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        spatial: SpatialDetector,
        triangular: TriangularDetector,
        statistical: StatisticalDetector,
        risk_gate: RiskGate,
        executor: PaperExecutor,
        fees: HashMap<String, TradingFee>,
    ) -> Self {
        Self { spatial, triangular, statistical, risk_gate, executor, fees, stats: PipelineStats::default(), trade_log: Vec::new() }
    }

    /// Run one detect -> risk-gate -> execute cycle.
    ///
    /// `orderbooks_by_symbol` is `{symbol -> {exchange -> OrderBook}}`,
    /// the input the spatial detector and statistical detector both
    /// consume; `triangular` is the optional per-venue input the
    /// triangular detector needs.
    pub fn run_once(
        &mut self,
        orderbooks_by_symbol: &HashMap<String, HashMap<String, OrderBook>>,
        triangular: Option<&TriangularInput>,
    ) -> Vec<ExecutedTrade> {
        self.stats.cycles_run += 1;

        let mut signals = Vec::new();
        for (symbol, books_by_exchange) in orderbooks_by_symbol {
            signals.extend(self.spatial.detect(symbol, books_by_exchange, &self.fees));
        }
        if let Some(input) = triangular {
            signals.extend(self.triangular.detect(&input.exchange, &input.books_by_symbol));
        }
        signals.extend(self.statistical.detect(&self.fees));

        self.stats.total_signals_detected += signals.len() as u64;

        let flat_orderbooks = flatten_orderbooks(orderbooks_by_symbol);
        self.executor.update_orderbooks(flat_orderbooks.clone());

        for (key, book) in &flat_orderbooks {
            self.statistical.update_history(key.clone(), book.mid_price());
        }
        self.risk_gate.update_market_history(&flat_orderbooks);

        let mut portfolio = self.executor.get_portfolio();
        let mut executed = Vec::new();

        for signal in signals {
            let decision = self.risk_gate.check_signal(&signal, portfolio.total_usd_value(), Some(&flat_orderbooks));
            match decision {
                RiskDecision::Rejected(reason) => {
                    self.stats.total_signals_rejected += 1;
                    *self.stats.rejection_reasons.entry(reason).or_insert(0) += 1;
                    continue;
                }
                RiskDecision::Approved => {
                    self.stats.total_signals_approved += 1;
                }
            }

            match self.executor.execute(&signal) {
                Ok((buy, sell)) => {
                    let pnl_usd = sell.notional() - buy.notional();
                    let fees_usd = buy.fee + sell.fee;
                    self.stats.total_pnl_usd += pnl_usd;
                    self.stats.total_fees_usd += fees_usd;
                    self.risk_gate.record_trade(pnl_usd, None);

                    info!(symbol = %signal.symbol, pnl_usd, "trade executed");
                    self.trade_log.push((signal.clone(), buy.clone(), sell.clone()));
                    executed.push(ExecutedTrade { signal, buy, sell, pnl_usd });

                    portfolio = self.executor.get_portfolio();
                }
                Err(e) => {
                    warn!(symbol = %signal.symbol, error = %e, "signal execution failed");
                    self.stats.total_signals_failed += 1;
                }
            }
        }

        executed
    }

    #[must_use]
    pub fn get_stats(&self) -> &PipelineStats {
        &self.stats
    }

    #[must_use]
    pub fn get_trade_log(&self) -> &[(ArbitrageSignal, crate::domain::TradeResult, crate::domain::TradeResult)] {
        &self.trade_log
    }
}

fn flatten_orderbooks(by_symbol: &HashMap<String, HashMap<String, OrderBook>>) -> HashMap<String, OrderBook> {
    let mut flat = HashMap::new();
    for books_by_exchange in by_symbol.values() {
        for (exchange, book) in books_by_exchange {
            flat.insert(format!("{exchange}:{}", book.symbol), book.clone());
        }
    }
    flat
}
