use std::collections::HashMap;
use std::sync::Arc;

use arbiter_core::cache::SharedCache;
use arbiter_core::cli::Cli;
use arbiter_core::collector::Collector;
use arbiter_core::config::Config;
use arbiter_core::detectors::{
    OlsCointegrationAnalyzer, RollingZScoreGenerator, SpatialDetector, StatisticalDetector,
    TriangularDetector,
};
use arbiter_core::domain::TradingFee;
use arbiter_core::exchange::FixtureConnector;
use arbiter_core::executor::PaperExecutor;
use arbiter_core::pipeline::{CacheOrderbookProvider, Pipeline, SimulatorLoop, SimulatorLoopConfig};
use arbiter_core::risk::{AnomalyDetector, AnomalyDetectorConfig, CircuitBreaker, CircuitBreakerConfig, DrawdownMonitor, RiskGate};

use clap::Parser;
use owo_colors::OwoColorize;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    println!("{} {}", "arbiter".bold(), env!("CARGO_PKG_VERSION").dimmed());

    let cli = Cli::parse();

    let mut config = match Config::load(cli.config_path(), "ARBITER") {
        Ok(c) => c,
        Err(e) => {
            let report =
                miette::Report::msg(format!("failed to load {}: {e}", cli.config_path().display()));
            eprintln!("{report:?}");
            std::process::exit(1);
        }
    };
    config.apply_mode_override(cli.mode.map(Into::into));
    config.init_logging();

    info!(mode = ?config.system.execution_mode, "arbiter starting");

    let mut simulator = match spawn(config).await {
        Ok(simulator) => simulator,
        Err(e) => {
            error!(error = %e, "fatal error during startup");
            std::process::exit(1);
        }
    };

    shutdown_signal().await;
    info!("shutdown signal received");
    simulator.stop().await;

    info!("arbiter stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

/// Wires collector, detectors, risk gate, and paper executor into a
/// running [`SimulatorLoop`] and returns it so the caller can drive
/// shutdown.
///
/// Real per-venue WebSocket dialects are out of scope (spec §1
/// non-goal): each configured venue gets a [`FixtureConnector`], a
/// scripted in-memory double that establishes a `Connected` state but
/// publishes nothing on its own. Feeding it real market data is left to
/// whatever drives this binary in a given deployment.
async fn spawn(config: Config) -> anyhow::Result<SimulatorLoop> {
    let cache = SharedCache::new();
    let collector = Collector::new(cache.clone());

    let mut fees = HashMap::new();
    for (name, venue) in &config.venues {
        let fee = TradingFee::new(venue.maker_fee_pct, venue.taker_fee_pct);
        fees.insert(name.clone(), fee);
        let mut connector = FixtureConnector::new(name.clone(), fee, HashMap::new());
        collector.start_connector(&mut connector).await;
    }

    let spatial = SpatialDetector::new(config.detectors.spatial.clone());
    let triangular = TriangularDetector::new(config.detectors.triangular.clone());
    let statistical = StatisticalDetector::new(
        config.detectors.statistical.clone(),
        Box::new(OlsCointegrationAnalyzer::default()),
        Box::new(RollingZScoreGenerator),
    );

    let risk_gate = RiskGate::new(
        config.risk.clone(),
        Some(DrawdownMonitor::new(config.risk.max_drawdown_pct)),
        Some(AnomalyDetector::new(AnomalyDetectorConfig::default())),
        Some(CircuitBreaker::new(CircuitBreakerConfig::default())),
    );

    let executor = PaperExecutor::new(config.initial_balances.clone(), fees.clone());
    let pipeline = Arc::new(parking_lot::Mutex::new(Pipeline::new(
        spatial, triangular, statistical, risk_gate, executor, fees,
    )));

    let provider = Arc::new(CacheOrderbookProvider::new(cache));
    let loop_config = SimulatorLoopConfig { symbols: config.symbols.clone(), ..Default::default() };
    Ok(SimulatorLoop::start(pipeline, provider, loop_config, None))
}
