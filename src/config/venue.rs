use serde::Deserialize;

use super::ConfigError;
use crate::ratelimit::RateLimitPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RateLimitPolicyConfig {
    Weight { limit: u32, window_secs: u64 },
    Count { limit: u32, window_secs: u64 },
    PerEndpoint { limit: u32, window_secs: u64 },
    TokenBucket { capacity: u32, refill_per_sec: f64 },
}

impl From<&RateLimitPolicyConfig> for RateLimitPolicy {
    fn from(config: &RateLimitPolicyConfig) -> Self {
        match *config {
            RateLimitPolicyConfig::Weight { limit, window_secs } => {
                RateLimitPolicy::Weight { limit, window_secs }
            }
            RateLimitPolicyConfig::Count { limit, window_secs } => {
                RateLimitPolicy::Count { limit, window_secs }
            }
            RateLimitPolicyConfig::PerEndpoint { limit, window_secs } => {
                RateLimitPolicy::PerEndpoint { limit, window_secs }
            }
            RateLimitPolicyConfig::TokenBucket { capacity, refill_per_sec } => {
                RateLimitPolicy::TokenBucket { capacity, refill_per_sec }
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    pub orderbook_depth: u32,
    pub reconnect_delay_s: u64,
    pub max_reconnect_attempts: u32,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            orderbook_depth: 10,
            reconnect_delay_s: 5,
            max_reconnect_attempts: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    #[serde(default = "default_tier")]
    pub tier: u8,
    #[serde(default = "default_fee_pct")]
    pub maker_fee_pct: f64,
    #[serde(default = "default_fee_pct")]
    pub taker_fee_pct: f64,
    #[serde(default)]
    pub rate_limit: Option<RateLimitPolicyConfig>,
    #[serde(default)]
    pub websocket: WebSocketConfig,

    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(skip)]
    pub api_secret: Option<String>,
    #[serde(skip)]
    pub api_passphrase: Option<String>,
}

fn default_tier() -> u8 {
    2
}

fn default_fee_pct() -> f64 {
    0.10
}

impl VenueConfig {
    #[allow(clippy::result_large_err)]
    pub(super) fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !(1..=3).contains(&self.tier) {
            return Err(ConfigError::InvalidValue {
                field: "venues.tier",
                reason: format!("{name}: tier must be between 1 and 3"),
            });
        }
        if self.maker_fee_pct < 0.0 || self.taker_fee_pct < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "venues.fee_pct",
                reason: format!("{name}: fee percentages must be >= 0"),
            });
        }
        if self.websocket.orderbook_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "venues.websocket.orderbook_depth",
                reason: format!("{name}: orderbook_depth must be > 0"),
            });
        }
        Ok(())
    }
}
