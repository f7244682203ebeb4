//! Trade batches for the feed window.
//!
//! A source always has a batch to play. Refreshes either replace it wholesale
//! or leave it alone; a failed or empty refresh never blanks the feed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::config::MarketLabel;
use crate::feed::synthetic::generate_batch;
use crate::feed::types::TradeEvent;
use crate::market_data::adapters::{TradeHistorySource, UpstreamTrade};
use crate::market_data::normaliser::trade_to_event;

pub type Batch = Arc<Vec<TradeEvent>>;

enum Mode {
    /// Generated once, cycled forever.
    Cycle,
    /// Regenerated every period with the next seed.
    Regenerate { every: Duration },
    Live {
        history: Arc<dyn TradeHistorySource>,
        markets: Vec<MarketLabel>,
        limit: usize,
        every: Duration,
        has_live_batch: bool,
    },
}

/// Synthetic generation parameters. Live sources keep one to produce the
/// placeholder batch shown before the first successful poll.
#[derive(Debug, Clone)]
pub struct SyntheticParams {
    pub seed: u64,
    pub candidates: Vec<String>,
    pub batch_size: usize,
}

pub struct TradeSource {
    mode: Mode,
    synthetic: SyntheticParams,
    generation: u64,
    batch: Batch,
}

impl TradeSource {
    /// Synthetic batch generated once from a pinned seed and cycled.
    pub fn cycling(params: SyntheticParams, anchor: DateTime<Utc>) -> Self {
        Self::with_mode(Mode::Cycle, params, anchor)
    }

    /// Synthetic batch regenerated every `every` to keep timestamps fresh.
    pub fn regenerating(params: SyntheticParams, every: Duration, anchor: DateTime<Utc>) -> Self {
        Self::with_mode(Mode::Regenerate { every }, params, anchor)
    }

    /// Real trades polled from `history`; synthetic placeholder until the
    /// first poll succeeds.
    pub fn live(
        history: Arc<dyn TradeHistorySource>,
        markets: Vec<MarketLabel>,
        limit: usize,
        every: Duration,
        placeholder: SyntheticParams,
        anchor: DateTime<Utc>,
    ) -> Self {
        let mode = Mode::Live { history, markets, limit, every, has_live_batch: false };
        Self::with_mode(mode, placeholder, anchor)
    }

    fn with_mode(mode: Mode, synthetic: SyntheticParams, anchor: DateTime<Utc>) -> Self {
        let batch = generate_batch(synthetic.seed, &synthetic.candidates, synthetic.batch_size, anchor);
        Self {
            mode,
            synthetic,
            generation: 0,
            batch: Arc::new(batch),
        }
    }

    /// The batch currently playing.
    pub fn current(&self) -> Batch {
        Arc::clone(&self.batch)
    }

    /// How often `refresh` should run; `None` for a cycling source.
    pub fn refresh_period(&self) -> Option<Duration> {
        match &self.mode {
            Mode::Cycle => None,
            Mode::Regenerate { every } => Some(*every),
            Mode::Live { every, .. } => Some(*every),
        }
    }

    /// Live sources want their first refresh straight away.
    pub fn is_live(&self) -> bool {
        matches!(self.mode, Mode::Live { .. })
    }

    pub fn has_live_batch(&self) -> bool {
        matches!(self.mode, Mode::Live { has_live_batch: true, .. })
    }

    /// Try to replace the current batch. Returns `true` if it changed.
    pub async fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        match &mut self.mode {
            Mode::Cycle => false,
            Mode::Regenerate { .. } => {
                self.generation += 1;
                let seed = self.synthetic.seed.wrapping_add(self.generation);
                let batch = generate_batch(seed, &self.synthetic.candidates, self.synthetic.batch_size, now);
                if batch.is_empty() {
                    return false;
                }
                self.batch = Arc::new(batch);
                true
            }
            Mode::Live { history, markets, limit, has_live_batch, .. } => {
                match fetch_live_batch(history.as_ref(), markets, *limit).await {
                    Some(batch) => {
                        if !*has_live_batch {
                            info!(size = batch.len(), "Switching trade feed to live data");
                        }
                        *has_live_batch = true;
                        self.batch = Arc::new(batch);
                        true
                    }
                    None => {
                        metrics::counter!("livefeed_trade_refresh_failures_total").increment(1);
                        false
                    }
                }
            }
        }
    }
}

/// Poll every market, merge newest-first and keep `limit` trades.
///
/// Any failed market fails the whole round so the board never shows a
/// one-sided batch; an empty result is treated as a failure too.
#[instrument(skip(history, markets), fields(market_count = markets.len()))]
pub async fn fetch_live_batch(
    history: &dyn TradeHistorySource,
    markets: &[MarketLabel],
    limit: usize,
) -> Option<Vec<TradeEvent>> {
    let results = join_all(markets.iter().map(|m| history.recent_trades(&m.ticker, limit))).await;

    let mut merged: Vec<(UpstreamTrade, &str)> = Vec::new();
    for (market, result) in markets.iter().zip(results) {
        match result {
            Ok(trades) => merged.extend(trades.into_iter().map(|t| (t, market.label.as_str()))),
            Err(e) => {
                warn!(ticker = %market.ticker, error = %e, "Trade history unavailable, keeping previous batch");
                return None;
            }
        }
    }

    merged.sort_by(|a, b| b.0.created_time.cmp(&a.0.created_time));
    let batch: Vec<TradeEvent> = merged
        .iter()
        .filter_map(|(trade, label)| trade_to_event(trade, label))
        .take(limit)
        .collect();

    if batch.is_empty() {
        debug!("Upstream returned no usable trades, keeping previous batch");
        return None;
    }
    Some(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FeedError, FeedResult};
    use crate::market_data::adapters::TakerSide;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubHistory {
        trades: Mutex<HashMap<String, Vec<UpstreamTrade>>>,
    }

    impl StubHistory {
        fn set(&self, ticker: &str, trades: Vec<UpstreamTrade>) {
            self.trades.lock().unwrap().insert(ticker.to_string(), trades);
        }

        fn fail(&self, ticker: &str) {
            self.trades.lock().unwrap().remove(ticker);
        }
    }

    #[async_trait::async_trait]
    impl TradeHistorySource for StubHistory {
        async fn recent_trades(&self, ticker: &str, limit: usize) -> FeedResult<Vec<UpstreamTrade>> {
            match self.trades.lock().unwrap().get(ticker) {
                Some(trades) => Ok(trades.iter().take(limit).cloned().collect()),
                None => Err(FeedError::Status { url: format!("stub/{}", ticker), status: 500 }),
            }
        }
    }

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 24, 20, 0, 0).unwrap()
    }

    fn trade(id: &str, ticker: &str, minutes_ago: i64) -> UpstreamTrade {
        UpstreamTrade {
            trade_id: id.into(),
            ticker: ticker.into(),
            count: 10,
            yes_price: 40,
            no_price: 60,
            taker_side: TakerSide::Yes,
            created_time: anchor() - ChronoDuration::minutes(minutes_ago),
        }
    }

    fn markets() -> Vec<MarketLabel> {
        vec![
            MarketLabel { ticker: "MKT-D".into(), label: "MAMDANI".into() },
            MarketLabel { ticker: "MKT-AC".into(), label: "CUOMO".into() },
        ]
    }

    fn params(seed: u64) -> SyntheticParams {
        SyntheticParams { seed, candidates: vec!["A".into(), "B".into()], batch_size: 20 }
    }

    #[tokio::test]
    async fn test_cycling_source_never_changes() {
        let mut source = TradeSource::cycling(params(1234), anchor());
        let before = source.current();
        assert_eq!(before.len(), 20);
        assert!(source.refresh_period().is_none());
        assert!(!source.refresh(anchor()).await);
        assert_eq!(source.current(), before);
    }

    #[tokio::test]
    async fn test_regenerating_source_replaces_batch() {
        let mut source = TradeSource::regenerating(params(1234), Duration::from_secs(30), anchor());
        let before = source.current();
        assert!(source.refresh(anchor() + ChronoDuration::seconds(30)).await);
        assert_ne!(source.current(), before);
        assert_eq!(source.current().len(), 20);
    }

    #[tokio::test]
    async fn test_live_batch_merged_and_labelled() {
        let stub = Arc::new(StubHistory::default());
        stub.set("MKT-D", vec![trade("d1", "MKT-D", 5), trade("d2", "MKT-D", 1)]);
        stub.set("MKT-AC", vec![trade("c1", "MKT-AC", 3)]);

        let batch = fetch_live_batch(stub.as_ref(), &markets(), 50).await.unwrap();
        let ids: Vec<&str> = batch.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["d2", "c1", "d1"]);
        assert_eq!(batch[1].side, "CUOMO");
        assert_eq!(batch[0].value, 400);
    }

    #[tokio::test]
    async fn test_live_batch_truncated_to_limit() {
        let stub = Arc::new(StubHistory::default());
        stub.set("MKT-D", (0..5).map(|i| trade(&format!("d{}", i), "MKT-D", i)).collect());
        stub.set("MKT-AC", (0..5).map(|i| trade(&format!("c{}", i), "MKT-AC", i)).collect());

        let batch = fetch_live_batch(stub.as_ref(), &markets(), 4).await.unwrap();
        assert_eq!(batch.len(), 4);
        for pair in batch.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn test_live_failure_keeps_previous_batch() {
        let stub = Arc::new(StubHistory::default());
        stub.set("MKT-D", vec![trade("d1", "MKT-D", 1)]);
        stub.set("MKT-AC", vec![trade("c1", "MKT-AC", 2)]);

        let mut source = TradeSource::live(
            stub.clone(),
            markets(),
            50,
            Duration::from_secs(30),
            params(7),
            anchor(),
        );
        assert!(source.is_live());
        assert!(!source.has_live_batch());
        let placeholder = source.current();
        assert_eq!(placeholder.len(), 20);

        assert!(source.refresh(anchor()).await);
        assert!(source.has_live_batch());
        let live = source.current();
        assert_eq!(live.len(), 2);

        stub.fail("MKT-AC");
        assert!(!source.refresh(anchor()).await);
        assert_eq!(source.current(), live);

        stub.set("MKT-AC", Vec::new());
        stub.set("MKT-D", Vec::new());
        assert!(!source.refresh(anchor()).await);
        assert_eq!(source.current(), live);
    }

    #[tokio::test]
    async fn test_live_failure_before_first_batch_keeps_placeholder() {
        let stub = Arc::new(StubHistory::default());
        let mut source =
            TradeSource::live(stub, markets(), 50, Duration::from_secs(30), params(7), anchor());
        let placeholder = source.current();
        assert!(!source.refresh(anchor()).await);
        assert_eq!(source.current(), placeholder);
        assert!(!source.has_live_batch());
    }
}
