//! Account balance snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Balance of a single asset on a single exchange.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    pub free: f64,
    pub locked: f64,
    pub usd_value: Option<f64>,
}

impl AssetBalance {
    #[must_use]
    pub fn new(asset: impl Into<String>, free: f64, locked: f64) -> Self {
        Self {
            asset: asset.into(),
            free,
            locked,
            usd_value: None,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.free + self.locked
    }
}

/// All asset balances on a single exchange.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExchangeBalance {
    pub exchange: String,
    pub balances: HashMap<String, AssetBalance>,
}

impl ExchangeBalance {
    #[must_use]
    pub fn new(exchange: impl Into<String>, balances: HashMap<String, AssetBalance>) -> Self {
        Self {
            exchange: exchange.into(),
            balances,
        }
    }

    /// Sum of every balance's non-null `usd_value`.
    #[must_use]
    pub fn total_usd_value(&self) -> f64 {
        self.balances.values().filter_map(|b| b.usd_value).sum()
    }
}

/// Portfolio-wide snapshot across all exchanges. Produced by the executor,
/// treated as read-only by every consumer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PortfolioSnapshot {
    pub timestamp: DateTime<Utc>,
    pub exchange_balances: HashMap<String, ExchangeBalance>,
}

impl PortfolioSnapshot {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, exchange_balances: HashMap<String, ExchangeBalance>) -> Self {
        Self {
            timestamp,
            exchange_balances,
        }
    }

    #[must_use]
    pub fn total_usd_value(&self) -> f64 {
        self.exchange_balances
            .values()
            .map(ExchangeBalance::total_usd_value)
            .sum()
    }
}
