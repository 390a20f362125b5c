use serde::Deserialize;

use super::ConfigError;

/// Portfolio-wide risk limits enforced by the composite risk gate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub max_position_per_coin_usd: f64,
    pub max_position_per_exchange_usd: f64,
    pub max_total_exposure_usd: f64,
    pub max_daily_loss_usd: f64,
    pub max_daily_loss_pct: f64,
    pub max_drawdown_pct: f64,
    pub price_deviation_threshold_pct: f64,
    pub max_spread_pct: f64,
    pub consecutive_loss_limit: u32,
    pub cooldown_minutes: u32,
    pub min_net_spread_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_per_coin_usd: 10_000.0,
            max_position_per_exchange_usd: 50_000.0,
            max_total_exposure_usd: 100_000.0,
            max_daily_loss_usd: 500.0,
            max_daily_loss_pct: 1.0,
            max_drawdown_pct: 5.0,
            price_deviation_threshold_pct: 10.0,
            max_spread_pct: 5.0,
            consecutive_loss_limit: 10,
            cooldown_minutes: 30,
            min_net_spread_pct: 0.0,
        }
    }
}

impl RiskConfig {
    #[allow(clippy::result_large_err)]
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        let positive_fields: [(&'static str, f64); 8] = [
            ("risk.max_position_per_coin_usd", self.max_position_per_coin_usd),
            ("risk.max_position_per_exchange_usd", self.max_position_per_exchange_usd),
            ("risk.max_total_exposure_usd", self.max_total_exposure_usd),
            ("risk.max_daily_loss_usd", self.max_daily_loss_usd),
            ("risk.max_drawdown_pct", self.max_drawdown_pct),
            ("risk.price_deviation_threshold_pct", self.price_deviation_threshold_pct),
            ("risk.max_spread_pct", self.max_spread_pct),
            ("risk.min_net_spread_pct", self.min_net_spread_pct),
        ];
        for (field, value) in positive_fields {
            if value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be >= 0".to_string(),
                });
            }
        }
        if self.consecutive_loss_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "risk.consecutive_loss_limit",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RiskConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_negative_limits() {
        let mut config = RiskConfig::default();
        config.max_daily_loss_usd = -1.0;
        assert!(config.validate().is_err());
    }
}
