use crate::broker::Broker;
use crate::cache::PerformanceCache;
use crate::config::Config;
use crate::metrics;
use crate::status;
use crate::types::{EquityMetrics, ViewModel};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Polling,
    Sleeping,
    Stopped,
}

/// Drives the poll → derive → render → sleep cycle.
///
/// A fetch failure never stops the loop: it degrades the cycle's health
/// and the view model still goes out with last-known or placeholder
/// values. The sleep is cut short by the `refresh` interrupt (a completed
/// position action) or ended for good by the shutdown channel. An
/// interrupt that fires mid-poll is held by the Notify permit and consumed
/// the moment the sleep begins.
pub struct RefreshScheduler {
    broker: Arc<dyn Broker>,
    cache: PerformanceCache,
    symbols: Vec<String>,
    interval: Duration,
    lookback_days: i64,
    show_week_change: bool,
    refresh: Arc<Notify>,
    shutdown: watch::Receiver<bool>,
    state: SchedulerState,
    cycle: u64,
}

impl RefreshScheduler {
    pub fn new(
        broker: Arc<dyn Broker>,
        cache: PerformanceCache,
        cfg: &Config,
        refresh: Arc<Notify>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            broker,
            cache,
            symbols: cfg.symbols.clone(),
            interval: Duration::from_secs(cfg.refresh_interval_secs),
            lookback_days: cfg.bars_lookback_days,
            show_week_change: cfg.show_week_change,
            refresh,
            shutdown,
            state: SchedulerState::Idle,
            cycle: 0,
        }
    }

    fn enter(&mut self, next: SchedulerState) {
        debug!("scheduler {:?} -> {next:?}", self.state);
        self.state = next;
    }

    /// Poll until shutdown, handing each cycle's view to the renderer.
    pub async fn run(&mut self, mut render: impl FnMut(&ViewModel)) {
        loop {
            let view = self.run_cycle().await;
            render(&view);

            if *self.shutdown.borrow() {
                break;
            }

            self.enter(SchedulerState::Sleeping);
            let stop = tokio::select! {
                _ = tokio::time::sleep(self.interval) => false,
                _ = self.refresh.notified() => {
                    info!("position action completed, skipping the rest of the sleep");
                    false
                }
                _ = self.shutdown.changed() => true,
            };
            if stop {
                break;
            }
        }
        self.enter(SchedulerState::Stopped);
        info!("scheduler stopped");
    }

    /// One full fetch-derive cycle. Always produces a view model.
    pub async fn run_cycle(&mut self) -> ViewModel {
        self.cycle += 1;
        self.enter(SchedulerState::Polling);
        info!("━━━ cycle #{} ━━━", self.cycle);

        let mut last_error: Option<String> = None;

        let account = self.broker.fetch_account().await;
        let health = status::evaluate(account.is_ok());
        let equity = match account {
            Ok(snapshot) => {
                debug!("account snapshot as of {}", snapshot.fetched_at);
                metrics::equity_metrics(&snapshot)
            }
            Err(e) => {
                error!("account fetch failed: {e}");
                last_error = Some(format!("account: {e}"));
                EquityMetrics::default()
            }
        };

        let positions = match self.broker.list_open_positions().await {
            Ok(positions) => positions,
            Err(e) => {
                error!("positions fetch failed: {e}");
                if last_error.is_none() {
                    last_error = Some(format!("positions: {e}"));
                }
                Vec::new()
            }
        };

        let broker = Arc::clone(&self.broker);
        let symbols = self.symbols.clone();
        let lookback_days = self.lookback_days;
        let show_week = self.show_week_change;
        let performance = self
            .cache
            .get_or_compute(&self.symbols, move || async move {
                let bars = broker.fetch_daily_bars(&symbols, lookback_days).await?;
                Ok(metrics::performance_rows(&bars, &symbols, show_week))
            })
            .await;

        debug!(
            "cycle #{}: {} | {} position(s), {} performance row(s)",
            self.cycle,
            health,
            positions.len(),
            performance.len()
        );

        ViewModel {
            health,
            equity,
            performance,
            positions,
            last_error,
            cycle: self.cycle,
            generated_at: Utc::now(),
        }
    }
}
