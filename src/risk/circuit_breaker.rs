//! Graduated-response circuit breaker over consecutive losses, daily
//! loss, and drawdown.

use std::time::{Duration, Instant};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Normal,
    Warning,
    Cooldown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub max_consecutive_losses: u32,
    pub max_daily_loss_usd: f64,
    pub max_drawdown_pct: f64,
    pub warning_threshold_pct: f64,
    pub cooldown_seconds: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_consecutive_losses: 5,
            max_daily_loss_usd: 500.0,
            max_drawdown_pct: 5.0,
            warning_threshold_pct: 70.0,
            cooldown_seconds: 1_800,
        }
    }
}

/// `state` is deliberately never externally observed as TRIGGERED:
/// crossing a max immediately collapses into COOLDOWN within the same
/// `update()` call.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: CircuitState,
    triggered_at: Option<Instant>,
    reason: String,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self { config, state: CircuitState::Normal, triggered_at: None, reason: String::new() }
    }

    /// Lazily expires COOLDOWN back to NORMAL, then applies the latest
    /// metrics. A no-op while already in COOLDOWN.
    pub fn update(&mut self, consecutive_losses: u32, daily_loss_usd: f64, drawdown_pct: f64) {
        self.expire_cooldown();
        if self.state == CircuitState::Cooldown {
            return;
        }

        if consecutive_losses >= self.config.max_consecutive_losses {
            self.trigger(format!(
                "consecutive losses {consecutive_losses} >= {}",
                self.config.max_consecutive_losses
            ));
            return;
        }
        if daily_loss_usd >= self.config.max_daily_loss_usd {
            self.trigger(format!(
                "daily loss {daily_loss_usd:.2} >= {:.2}",
                self.config.max_daily_loss_usd
            ));
            return;
        }
        if drawdown_pct >= self.config.max_drawdown_pct {
            self.trigger(format!("drawdown {drawdown_pct:.2}% >= {:.2}%", self.config.max_drawdown_pct));
            return;
        }

        let warning_ratio = self.config.warning_threshold_pct / 100.0;
        let warning = f64::from(consecutive_losses) >= f64::from(self.config.max_consecutive_losses) * warning_ratio
            || daily_loss_usd >= self.config.max_daily_loss_usd * warning_ratio
            || drawdown_pct >= self.config.max_drawdown_pct * warning_ratio;

        self.state = if warning { CircuitState::Warning } else { CircuitState::Normal };
    }

    pub fn trigger(&mut self, reason: impl Into<String>) {
        self.state = CircuitState::Cooldown;
        self.triggered_at = Some(Instant::now());
        self.reason = reason.into();
    }

    pub fn reset(&mut self) {
        self.state = CircuitState::Normal;
        self.triggered_at = None;
        self.reason.clear();
    }

    pub fn state(&mut self) -> CircuitState {
        self.expire_cooldown();
        self.state
    }

    pub fn can_trade(&mut self) -> bool {
        matches!(self.state(), CircuitState::Normal | CircuitState::Warning)
    }

    pub fn position_scale(&mut self) -> f64 {
        match self.state() {
            CircuitState::Normal => 1.0,
            CircuitState::Warning => 0.5,
            CircuitState::Cooldown => 0.0,
        }
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    fn expire_cooldown(&mut self) {
        if self.state != CircuitState::Cooldown {
            return;
        }
        if let Some(triggered_at) = self.triggered_at {
            if triggered_at.elapsed() >= Duration::from_secs(self.config.cooldown_seconds) {
                self.state = CircuitState::Normal;
                self.triggered_at = None;
            }
        }
    }
}
