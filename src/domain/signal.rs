//! Arbitrage opportunities emitted by detectors.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::ids::SignalId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArbitrageStrategy {
    Spatial,
    Triangular,
    Statistical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStatus {
    Detected,
    Approved,
    Rejected,
    Executed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArbitrageSignal {
    pub id: SignalId,
    pub strategy: ArbitrageStrategy,
    pub buy_exchange: String,
    pub sell_exchange: String,
    pub symbol: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub quantity: f64,
    pub gross_spread_pct: f64,
    pub net_spread_pct: f64,
    pub estimated_profit_usd: f64,
    pub confidence: f64,
    pub orderbook_depth_usd: f64,
    pub status: SignalStatus,
    pub detected_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, Value>,
}

/// Fields common to every strategy; strategy-specific fields go in
/// `metadata` rather than growing this struct per detector.
pub struct ArbitrageSignalBuilder {
    strategy: ArbitrageStrategy,
    buy_exchange: String,
    sell_exchange: String,
    symbol: String,
    buy_price: f64,
    sell_price: f64,
    quantity: f64,
    gross_spread_pct: f64,
    net_spread_pct: f64,
    estimated_profit_usd: f64,
    confidence: f64,
    orderbook_depth_usd: f64,
    metadata: HashMap<String, Value>,
}

impl ArbitrageSignalBuilder {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        strategy: ArbitrageStrategy,
        buy_exchange: impl Into<String>,
        sell_exchange: impl Into<String>,
        symbol: impl Into<String>,
        buy_price: f64,
        sell_price: f64,
        quantity: f64,
    ) -> Self {
        Self {
            strategy,
            buy_exchange: buy_exchange.into(),
            sell_exchange: sell_exchange.into(),
            symbol: symbol.into(),
            buy_price,
            sell_price,
            quantity,
            gross_spread_pct: 0.0,
            net_spread_pct: 0.0,
            estimated_profit_usd: 0.0,
            confidence: 0.0,
            orderbook_depth_usd: 0.0,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn gross_spread_pct(mut self, value: f64) -> Self {
        self.gross_spread_pct = value;
        self
    }

    #[must_use]
    pub fn net_spread_pct(mut self, value: f64) -> Self {
        self.net_spread_pct = value;
        self
    }

    #[must_use]
    pub fn estimated_profit_usd(mut self, value: f64) -> Self {
        self.estimated_profit_usd = value;
        self
    }

    #[must_use]
    pub fn confidence(mut self, value: f64) -> Self {
        self.confidence = value.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn orderbook_depth_usd(mut self, value: f64) -> Self {
        self.orderbook_depth_usd = value;
        self
    }

    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn build(self) -> ArbitrageSignal {
        ArbitrageSignal {
            id: SignalId::new(),
            strategy: self.strategy,
            buy_exchange: self.buy_exchange,
            sell_exchange: self.sell_exchange,
            symbol: self.symbol,
            buy_price: self.buy_price,
            sell_price: self.sell_price,
            quantity: self.quantity,
            gross_spread_pct: self.gross_spread_pct,
            net_spread_pct: self.net_spread_pct,
            estimated_profit_usd: self.estimated_profit_usd,
            confidence: self.confidence,
            orderbook_depth_usd: self.orderbook_depth_usd,
            status: SignalStatus::Detected,
            detected_at: Utc::now(),
            executed_at: None,
            metadata: self.metadata,
        }
    }
}
