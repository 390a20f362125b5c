//! Multi-layer risk discipline: drawdown, anomaly, circuit breaker, and
//! the composite gate that sequences them.

mod anomaly;
mod circuit_breaker;
mod drawdown;
mod manager;

pub use anomaly::{AnomalyDetector, AnomalyDetectorConfig};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use drawdown::DrawdownMonitor;
pub use manager::{RiskDecision, RiskGate};
