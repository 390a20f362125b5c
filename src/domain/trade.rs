//! Result of a simulated or real order fill.

use chrono::{DateTime, Utc};

use super::order::Order;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradeResult {
    pub order: Order,
    pub filled_quantity: f64,
    pub filled_price: f64,
    pub fee: f64,
    pub fee_asset: String,
    pub latency_ms: f64,
    pub filled_at: DateTime<Utc>,
}

impl TradeResult {
    #[must_use]
    pub fn new(
        order: Order,
        filled_quantity: f64,
        filled_price: f64,
        fee: f64,
        fee_asset: impl Into<String>,
        latency_ms: f64,
        filled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order,
            filled_quantity,
            filled_price,
            fee,
            fee_asset: fee_asset.into(),
            latency_ms,
            filled_at,
        }
    }

    /// Notional value of the fill, before fees.
    #[must_use]
    pub fn notional(&self) -> f64 {
        self.filled_quantity * self.filled_price
    }
}
