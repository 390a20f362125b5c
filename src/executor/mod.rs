//! Paper-trading execution: stateless fill simulation plus the stateful
//! multi-exchange balance ledger.

mod fill_simulator;
mod paper;

pub use fill_simulator::simulate_fill;
pub use paper::{ExecutorError, PaperExecutor};
