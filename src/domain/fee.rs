//! Venue trading fee schedule.

/// Maker/taker fee schedule for one venue, in percent (e.g. `0.10` = 0.10%).
/// Immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradingFee {
    pub maker_pct: f64,
    pub taker_pct: f64,
}

impl TradingFee {
    #[must_use]
    pub const fn new(maker_pct: f64, taker_pct: f64) -> Self {
        Self {
            maker_pct,
            taker_pct,
        }
    }

    /// The fallback fee schedule used throughout the detectors and
    /// executor whenever a venue has no configured fee.
    #[must_use]
    pub const fn default_fallback() -> Self {
        Self::new(0.1, 0.1)
    }
}

impl Default for TradingFee {
    fn default() -> Self {
        Self::default_fallback()
    }
}
