//! Detect -> risk-gate -> execute orchestration, plus the cooperative
//! loop that drives it on a fixed cycle interval.

mod orchestrator;
mod simulator_loop;

pub use orchestrator::{ExecutedTrade, Pipeline, PipelineStats, TriangularInput};
pub use simulator_loop::{
    CacheOrderbookProvider, OrderbookProvider, SimulatorLoop, SimulatorLoopConfig, TradeHook,
    DEFAULT_CYCLE_INTERVAL,
};
