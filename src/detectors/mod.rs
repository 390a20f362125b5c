//! Arbitrage opportunity detectors: spatial (cross-venue), triangular
//! (single-venue cycles), and statistical (cointegrated pairs).

mod cointegration;
mod spatial;
mod statistical;
mod triangular;

pub use cointegration::{
    CointegrationAnalyzer, CointegrationResult, OlsCointegrationAnalyzer, RollingZScoreGenerator,
    ZScoreGenerator, ZScoreOutput, ZScoreSignal,
};
pub use spatial::{SpatialDetector, SpatialDetectorConfig};
pub use statistical::{StatisticalDetector, StatisticalDetectorConfig};
pub use triangular::{TriangularDetector, TriangularDetectorConfig};
