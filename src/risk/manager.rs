//! Composite risk gate: the ordered, short-circuiting check list that
//! every signal passes through before execution.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};

use super::anomaly::AnomalyDetector;
use super::circuit_breaker::CircuitBreaker;
use super::drawdown::DrawdownMonitor;
use crate::config::RiskConfig;
use crate::domain::{ArbitrageSignal, OrderBook};

#[derive(Debug, Clone, PartialEq)]
pub enum RiskDecision {
    Approved,
    Rejected(String),
}

impl RiskDecision {
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, RiskDecision::Approved)
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            RiskDecision::Approved => "approved",
            RiskDecision::Rejected(reason) => reason,
        }
    }
}

pub struct RiskGate {
    config: RiskConfig,
    drawdown_monitor: Option<DrawdownMonitor>,
    anomaly_detector: Option<AnomalyDetector>,
    circuit_breaker: Option<CircuitBreaker>,
    daily_pnl: f64,
    daily_pnl_date: Option<NaiveDate>,
    consecutive_losses: u32,
    cooldown_until: Option<Instant>,
    trade_count: u64,
}

impl RiskGate {
    #[must_use]
    pub fn new(
        config: RiskConfig,
        drawdown_monitor: Option<DrawdownMonitor>,
        anomaly_detector: Option<AnomalyDetector>,
        circuit_breaker: Option<CircuitBreaker>,
    ) -> Self {
        Self {
            config,
            drawdown_monitor,
            anomaly_detector,
            circuit_breaker,
            daily_pnl: 0.0,
            daily_pnl_date: None,
            consecutive_losses: 0,
            cooldown_until: None,
            trade_count: 0,
        }
    }

    #[must_use]
    pub fn trade_count(&self) -> u64 {
        self.trade_count
    }

    #[must_use]
    pub fn daily_pnl(&self) -> f64 {
        self.daily_pnl
    }

    /// Feed this cycle's order books into the anomaly detector's rolling
    /// history, when one is configured. Keyed the same way
    /// `check_signal`'s `orderbooks` argument is: `"{exchange}:{symbol}"`.
    pub fn update_market_history(&mut self, orderbooks: &HashMap<String, OrderBook>) {
        let Some(anomaly) = &mut self.anomaly_detector else { return };
        for (key, book) in orderbooks {
            anomaly.update_history(key.clone(), book);
        }
    }

    /// Run the eight ordered checks in `spec.md` §4.8, short-circuiting on
    /// the first rejection.
    pub fn check_signal(
        &mut self,
        signal: &ArbitrageSignal,
        portfolio_total_usd: f64,
        orderbooks: Option<&HashMap<String, OrderBook>>,
    ) -> RiskDecision {
        if let Some(cooldown_until) = self.cooldown_until {
            if Instant::now() < cooldown_until {
                return RiskDecision::Rejected("legacy cooldown active".to_string());
            }
        }
        if let Some(cb) = &mut self.circuit_breaker {
            if !cb.can_trade() {
                return RiskDecision::Rejected(format!("circuit breaker: {}", cb.reason()));
            }
        }

        if let (Some(anomaly), Some(books)) = (&self.anomaly_detector, orderbooks) {
            for (key, exchange) in
                [("buy", &signal.buy_exchange), ("sell", &signal.sell_exchange)]
            {
                let lookup_key = format!("{exchange}:{}", signal.symbol);
                if let Some(book) = books.get(&lookup_key) {
                    let now = Utc::now().timestamp() as f64;
                    if let Err(reason) = anomaly.check_orderbook(&lookup_key, book, now) {
                        return RiskDecision::Rejected(format!("anomaly on {key} leg: {reason}"));
                    }
                }
            }
        }

        if let Some(drawdown) = &self.drawdown_monitor {
            let (ok, reason) = drawdown.check();
            if !ok {
                return RiskDecision::Rejected(reason);
            }
        }

        let position_usd = signal.quantity * signal.buy_price;
        if position_usd > self.config.max_position_per_coin_usd {
            return RiskDecision::Rejected(format!(
                "position size {position_usd:.2} exceeds max_position_per_coin_usd {:.2}",
                self.config.max_position_per_coin_usd
            ));
        }

        if self.daily_pnl < -self.config.max_daily_loss_usd {
            return RiskDecision::Rejected(format!(
                "daily loss {:.2} exceeds max_daily_loss_usd {:.2}",
                self.daily_pnl, self.config.max_daily_loss_usd
            ));
        }

        if signal.gross_spread_pct.abs() > self.config.max_spread_pct {
            return RiskDecision::Rejected(format!(
                "gross spread {:.3}% exceeds max_spread_pct {:.3}%",
                signal.gross_spread_pct, self.config.max_spread_pct
            ));
        }

        if signal.net_spread_pct.abs() > self.config.price_deviation_threshold_pct {
            return RiskDecision::Rejected(format!(
                "net spread {:.3}% exceeds price_deviation_threshold_pct {:.3}%",
                signal.net_spread_pct, self.config.price_deviation_threshold_pct
            ));
        }

        let projected_exposure = portfolio_total_usd + position_usd;
        if projected_exposure > self.config.max_total_exposure_usd {
            return RiskDecision::Rejected(format!(
                "projected exposure {projected_exposure:.2} exceeds max_total_exposure_usd {:.2}",
                self.config.max_total_exposure_usd
            ));
        }

        RiskDecision::Approved
    }

    /// Update post-trade bookkeeping: daily PnL (resets on date
    /// rollover), consecutive-loss streak, and forwards to the drawdown
    /// monitor and circuit breaker when configured.
    pub fn record_trade(&mut self, pnl: f64, equity: Option<f64>) {
        let today = Utc::now().date_naive();
        if self.daily_pnl_date != Some(today) {
            self.daily_pnl = 0.0;
            self.daily_pnl_date = Some(today);
        }
        self.daily_pnl += pnl;
        self.trade_count += 1;

        if pnl < 0.0 {
            self.consecutive_losses += 1;
        } else {
            self.consecutive_losses = 0;
        }

        if self.consecutive_losses >= self.config.consecutive_loss_limit {
            self.cooldown_until =
                Some(Instant::now() + Duration::from_secs(u64::from(self.config.cooldown_minutes) * 60));
        }

        if let Some(equity) = equity {
            if let Some(drawdown) = &mut self.drawdown_monitor {
                drawdown.update(equity);
            }
        }

        if let Some(cb) = &mut self.circuit_breaker {
            let daily_loss_usd = (-self.daily_pnl).max(0.0);
            let drawdown_pct =
                self.drawdown_monitor.as_ref().map_or(0.0, DrawdownMonitor::current_drawdown_pct);
            cb.update(self.consecutive_losses, daily_loss_usd, drawdown_pct);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArbitrageSignalBuilder, ArbitrageStrategy};

    fn signal(quantity: f64, buy_price: f64) -> ArbitrageSignal {
        ArbitrageSignalBuilder::new(
            ArbitrageStrategy::Spatial,
            "binance",
            "upbit",
            "BTC/USDT",
            buy_price,
            buy_price * 1.01,
            quantity,
        )
        .gross_spread_pct(1.0)
        .net_spread_pct(0.8)
        .estimated_profit_usd(10.0)
        .build()
    }

    #[test]
    fn scenario_three_rejects_oversized_position() {
        let mut gate = RiskGate::new(
            RiskConfig { max_position_per_coin_usd: 100.0, ..RiskConfig::default() },
            None,
            None,
            None,
        );
        let decision = gate.check_signal(&signal(0.01, 50_000.0), 0.0, None);
        assert!(!decision.is_approved());
    }

    #[test]
    fn approves_signal_within_all_limits() {
        let mut gate = RiskGate::new(RiskConfig::default(), None, None, None);
        let decision = gate.check_signal(&signal(0.01, 50_000.0), 0.0, None);
        assert_eq!(decision, RiskDecision::Approved);
        assert_eq!(decision.reason(), "approved");
    }

    #[test]
    fn consecutive_losses_trigger_legacy_cooldown() {
        let mut gate = RiskGate::new(
            RiskConfig { consecutive_loss_limit: 2, cooldown_minutes: 30, ..RiskConfig::default() },
            None,
            None,
            None,
        );
        gate.record_trade(-10.0, None);
        gate.record_trade(-10.0, None);
        let decision = gate.check_signal(&signal(0.01, 50_000.0), 0.0, None);
        assert!(!decision.is_approved());
    }

    #[test]
    fn winning_trade_resets_consecutive_losses() {
        let mut gate = RiskGate::new(RiskConfig::default(), None, None, None);
        gate.record_trade(-5.0, None);
        gate.record_trade(5.0, None);
        assert_eq!(gate.consecutive_losses, 0);
    }
}
