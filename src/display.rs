//! One running display: pacing, trade refresh and odds polling as independent
//! tasks, published to the presentation layer through watch channels.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, TradeMode};
use crate::feed::pacing::PacingController;
use crate::feed::rng::SeededRng;
use crate::feed::source::{Batch, SyntheticParams, TradeSource};
use crate::feed::types::DisplayedTrade;
use crate::feed::window::FeedWindow;
use crate::market_data::adapters::{OddsSource, TradeHistorySource};
use crate::market_data::reconciler::{OddsReconciler, OddsSnapshot};

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub trades: Vec<DisplayedTrade>,
    pub odds: OddsSnapshot,
}

pub struct Display {
    trades_rx: watch::Receiver<Vec<DisplayedTrade>>,
    odds_rx: watch::Receiver<OddsSnapshot>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Display {
    /// Spawn the display's tasks on the current tokio runtime.
    pub fn spawn(
        pacing: PacingController,
        window: FeedWindow,
        source: TradeSource,
        odds: OddsReconciler,
        odds_every: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (batch_tx, batch_rx) = watch::channel(source.current());
        let (trades_tx, trades_rx) = watch::channel(window.displayed());
        let (odds_tx, odds_rx) = watch::channel(odds.snapshot());

        let tasks = vec![
            tokio::spawn(run_pacing(pacing, window, batch_rx, trades_tx, shutdown_rx.clone())),
            tokio::spawn(run_trade_refresh(source, batch_tx, shutdown_rx.clone())),
            tokio::spawn(run_odds(odds, odds_every, odds_tx, shutdown_rx)),
        ];

        Self { trades_rx, odds_rx, shutdown_tx, tasks }
    }

    /// Build every component from configuration and spawn them.
    ///
    /// Without a pinned seed, `started_at` seeds both the pacing and the
    /// synthetic content.
    pub fn from_config(
        cfg: &AppConfig,
        odds_source: Arc<dyn OddsSource>,
        history: Arc<dyn TradeHistorySource>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let seed = cfg.trades.seed.unwrap_or(started_at.timestamp_millis().unsigned_abs());
        let params = SyntheticParams {
            seed,
            candidates: cfg.trades.candidates.clone(),
            batch_size: cfg.trades.batch_size,
        };

        let source = match cfg.trades.mode {
            TradeMode::Live => TradeSource::live(
                history,
                cfg.trades.markets.clone(),
                cfg.trades.live_limit,
                Duration::from_secs(cfg.trades.live_poll_every_secs),
                params,
                started_at,
            ),
            TradeMode::Synthetic if cfg.trades.seed.is_some() => TradeSource::cycling(params, started_at),
            TradeMode::Synthetic => TradeSource::regenerating(
                params,
                Duration::from_secs(cfg.trades.regenerate_every_secs),
                started_at,
            ),
        };

        let pacing = PacingController::new(&cfg.pacing, SeededRng::new(seed));
        let window = FeedWindow::new(cfg.display.window_size, cfg.display.opacities.clone());
        let odds = OddsReconciler::new(
            odds_source,
            &cfg.odds.primary,
            cfg.odds.secondary.as_deref(),
            OddsSnapshot::initial(cfg.odds.initial_primary, started_at),
        );

        info!(seed, mode = ?cfg.trades.mode, window = cfg.display.window_size, "Starting display");
        Self::spawn(pacing, window, source, odds, Duration::from_millis(cfg.odds.poll_interval_ms))
    }

    pub fn frame(&self) -> Frame {
        Frame {
            trades: self.trades_rx.borrow().clone(),
            odds: *self.odds_rx.borrow(),
        }
    }

    pub fn subscribe_trades(&self) -> watch::Receiver<Vec<DisplayedTrade>> {
        self.trades_rx.clone()
    }

    pub fn subscribe_odds(&self) -> watch::Receiver<OddsSnapshot> {
        self.odds_rx.clone()
    }

    /// Stop every task, abandoning any in-flight poll, and wait for them.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(error = %e, "Display task ended abnormally");
            }
        }
        info!("Display stopped");
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

// Self-rescheduling one-shot: each firing sleeps for the interval the previous
// tick chose, so burst intervals take effect immediately.
async fn run_pacing(
    mut pacing: PacingController,
    mut window: FeedWindow,
    batch_rx: watch::Receiver<Batch>,
    trades_tx: watch::Sender<Vec<DisplayedTrade>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut delay = Duration::from_millis(pacing.state().interval_ms);
    loop {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => break,
        }

        let batch = batch_rx.borrow().clone();
        if window.advance(&batch).is_some() {
            trades_tx.send_replace(window.displayed());
            metrics::counter!("livefeed_ticks_total").increment(1);
        }

        let state = pacing.tick();
        delay = Duration::from_millis(state.interval_ms);
    }
    debug!("Pacing task stopped");
}

async fn run_trade_refresh(
    mut source: TradeSource,
    batch_tx: watch::Sender<Batch>,
    mut shutdown: watch::Receiver<bool>,
) {
    let Some(every) = source.refresh_period() else {
        debug!("Trade source cycles a fixed batch, no refresh task needed");
        return;
    };
    let start = if source.is_live() { Instant::now() } else { Instant::now() + every };
    let mut interval = tokio::time::interval_at(start, every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => break,
        }
        tokio::select! {
            changed = source.refresh(Utc::now()) => {
                if changed {
                    batch_tx.send_replace(source.current());
                }
            }
            _ = shutdown.changed() => break,
        }
    }
    debug!("Trade refresh task stopped");
}

// Fixed-period poll, first one immediately.
async fn run_odds(
    mut odds: OddsReconciler,
    every: Duration,
    odds_tx: watch::Sender<OddsSnapshot>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => break,
        }
        tokio::select! {
            snapshot = odds.poll() => {
                odds_tx.send_replace(snapshot);
            }
            _ = shutdown.changed() => break,
        }
    }
    debug!("Odds task stopped");
}
