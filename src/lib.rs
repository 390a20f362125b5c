//! arbiter-core - cross-exchange cryptocurrency arbitrage engine.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── domain/     # Pure domain types: orders, books, balances, signals
//! ├── config/     # TOML + env configuration, validated at startup
//! ├── ratelimit/  # Per-venue rate limiter presets and policies
//! ├── exchange/   # Connector contract, reconnecting supervisor, normalization
//! ├── cache/      # Shared order-book cache and price-update pub/sub
//! ├── collector/  # Fans connector callbacks into the cache
//! ├── spread/     # Pure cross-exchange spread/profit math
//! ├── detectors/  # Spatial, triangular, and statistical arbitrage detectors
//! ├── risk/       # Drawdown, anomaly, circuit breaker, and the composite gate
//! ├── executor/   # Paper-trading fill simulation and balance ledger
//! └── pipeline/   # Per-cycle orchestration and the simulator loop
//! ```

pub mod cache;
pub mod cli;
pub mod collector;
pub mod config;
pub mod detectors;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod executor;
pub mod pipeline;
pub mod ratelimit;
pub mod risk;
pub mod spread;
