//! Cooperative loop driving the pipeline on a fixed cycle interval.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::warn;

use super::orchestrator::{ExecutedTrade, Pipeline};
use crate::cache::SharedCache;
use crate::domain::OrderBook;

/// Default cycle interval per spec §4.11.
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SimulatorLoopConfig {
    pub cycle_interval: Duration,
    pub symbols: Vec<String>,
}

impl Default for SimulatorLoopConfig {
    fn default() -> Self {
        Self { cycle_interval: DEFAULT_CYCLE_INTERVAL, symbols: Vec::new() }
    }
}

/// Supplies the per-cycle order-book snapshot. The default implementation
/// fetches every enabled symbol fresh from the shared cache.
pub trait OrderbookProvider: Send + Sync {
    fn snapshot(&self, symbols: &[String]) -> HashMap<String, HashMap<String, OrderBook>>;
}

pub struct CacheOrderbookProvider {
    cache: SharedCache,
}

impl CacheOrderbookProvider {
    #[must_use]
    pub fn new(cache: SharedCache) -> Self {
        Self { cache }
    }
}

impl OrderbookProvider for CacheOrderbookProvider {
    fn snapshot(&self, symbols: &[String]) -> HashMap<String, HashMap<String, OrderBook>> {
        symbols.iter().map(|symbol| (symbol.clone(), self.cache.get_all_orderbooks(symbol))).collect()
    }
}

/// Optional per-trade callback. Errors are logged and swallowed so a
/// misbehaving hook can never abort the loop (spec §4.11).
#[async_trait]
pub trait TradeHook: Send + Sync {
    async fn on_trade(&self, trade: &ExecutedTrade) -> anyhow::Result<()>;
}

/// A background task driving [`Pipeline::run_once`] on a fixed interval.
/// Cancellation is observed only at the sleep boundary between cycles;
/// `stop()` is idempotent and awaits task completion.
pub struct SimulatorLoop {
    wins: Arc<AtomicU64>,
    total: Arc<AtomicU64>,
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl SimulatorLoop {
    pub fn start(
        pipeline: Arc<Mutex<Pipeline>>,
        provider: Arc<dyn OrderbookProvider>,
        config: SimulatorLoopConfig,
        hook: Option<Arc<dyn TradeHook>>,
    ) -> Self {
        let wins = Arc::new(AtomicU64::new(0));
        let total = Arc::new(AtomicU64::new(0));
        let cancelled = Arc::new(AtomicBool::new(false));
        let notify = Arc::new(Notify::new());

        let wins_task = wins.clone();
        let total_task = total.clone();
        let cancelled_task = cancelled.clone();
        let notify_task = notify.clone();

        let handle = tokio::spawn(async move {
            loop {
                if cancelled_task.load(Ordering::SeqCst) {
                    break;
                }

                let snapshot = provider.snapshot(&config.symbols);
                let executed = pipeline.lock().run_once(&snapshot, None);

                for trade in &executed {
                    total_task.fetch_add(1, Ordering::SeqCst);
                    if trade.pnl_usd > 0.0 {
                        wins_task.fetch_add(1, Ordering::SeqCst);
                    }
                    if let Some(hook) = &hook {
                        if let Err(e) = hook.on_trade(trade).await {
                            warn!(error = %e, "on_trade hook failed, continuing");
                        }
                    }
                }

                tokio::select! {
                    () = tokio::time::sleep(config.cycle_interval) => {}
                    () = notify_task.notified() => break,
                }
            }
        });

        Self { wins, total, cancelled, notify, handle: Some(handle) }
    }

    /// `winning_trades / total_trades`, or 0 with no trades yet.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        let total = self.total.load(Ordering::SeqCst);
        if total == 0 {
            0.0
        } else {
            self.wins.load(Ordering::SeqCst) as f64 / total as f64
        }
    }

    #[must_use]
    pub fn total_trades(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Idempotent: cancels at the next sleep boundary and awaits the task.
    pub async fn stop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_one();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
