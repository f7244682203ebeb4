use std::collections::VecDeque;

use tracing::trace;

use crate::feed::types::{DisplayedTrade, TradeEvent};

/// The rolling list of trades on screen, newest first, never longer than
/// `capacity`.
#[derive(Debug, Clone)]
pub struct FeedWindow {
    capacity: usize,
    opacities: Vec<f32>,
    trades: VecDeque<TradeEvent>,
    cursor: usize, // next index into the source batch
}

impl FeedWindow {
    pub fn new(capacity: usize, opacities: Vec<f32>) -> Self {
        Self {
            capacity,
            opacities,
            trades: VecDeque::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Show the next trade from `batch`, round-robin.
    ///
    /// Returns the trade that was pushed, or `None` when the batch is empty.
    pub fn advance(&mut self, batch: &[TradeEvent]) -> Option<&TradeEvent> {
        if batch.is_empty() || self.capacity == 0 {
            return None;
        }
        // a replacement batch may be shorter than the old one
        if self.cursor >= batch.len() {
            self.cursor = 0;
        }

        self.trades.push_front(batch[self.cursor].clone());
        self.trades.truncate(self.capacity);
        trace!(cursor = self.cursor, len = self.trades.len(), "Advanced feed window");

        self.cursor = (self.cursor + 1) % batch.len();
        self.trades.front()
    }

    /// Opacity for a row; rows past the end of the table reuse its last entry.
    pub fn opacity_at(&self, position: usize) -> f32 {
        self.opacities
            .get(position)
            .or_else(|| self.opacities.last())
            .copied()
            .unwrap_or(1.0)
            .clamp(0.0, 1.0)
    }

    pub fn trades(&self) -> impl Iterator<Item = &TradeEvent> {
        self.trades.iter()
    }

    /// Rows as the presentation layer draws them.
    pub fn displayed(&self) -> Vec<DisplayedTrade> {
        self.trades
            .iter()
            .enumerate()
            .map(|(i, event)| DisplayedTrade { event: event.clone(), opacity: self.opacity_at(i) })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn batch(n: usize) -> Vec<TradeEvent> {
        (0..n)
            .map(|i| TradeEvent {
                id: format!("t-{}", i),
                value: 100 + i as u64,
                side: "A".into(),
                timestamp: Utc::now(),
                decorative_color_seed: i as u64,
            })
            .collect()
    }

    #[test]
    fn test_newest_first_and_evicts_oldest() {
        let source = batch(5);
        let mut window = FeedWindow::new(3, vec![1.0, 0.5, 0.2]);
        for _ in 0..4 {
            window.advance(&source);
        }
        let ids: Vec<&str> = window.trades().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t-3", "t-2", "t-1"]);
    }

    #[test]
    fn test_round_robin_wraps() {
        let source = batch(4);
        let mut window = FeedWindow::new(7, vec![]);
        let first = window.advance(&source).cloned();
        for _ in 1..source.len() {
            window.advance(&source);
        }
        assert_eq!(window.cursor(), 0);
        let again = window.advance(&source).cloned();
        assert_eq!(first, again);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut window = FeedWindow::new(7, vec![]);
        assert!(window.advance(&[]).is_none());
        assert!(window.is_empty());
        assert_eq!(window.cursor(), 0);
    }

    #[test]
    fn test_shorter_replacement_batch_restarts() {
        let mut window = FeedWindow::new(7, vec![]);
        let long = batch(5);
        for _ in 0..4 {
            window.advance(&long);
        }
        let short = batch(2);
        let pushed = window.advance(&short).map(|t| t.id.clone());
        assert_eq!(pushed.as_deref(), Some("t-0"));
    }

    #[test]
    fn test_opacity_clamps_to_last_entry() {
        let window = FeedWindow::new(11, vec![1.0, 0.8, 0.6]);
        assert_eq!(window.opacity_at(0), 1.0);
        assert_eq!(window.opacity_at(2), 0.6);
        assert_eq!(window.opacity_at(10), 0.6);

        let unconfigured = FeedWindow::new(3, vec![]);
        assert_eq!(unconfigured.opacity_at(1), 1.0);
    }

    #[test]
    fn test_displayed_pairs_rows_with_opacity() {
        let source = batch(3);
        let mut window = FeedWindow::new(7, vec![1.0, 0.5]);
        for _ in 0..3 {
            window.advance(&source);
        }
        let rows = window.displayed();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].event.id, "t-2");
        assert_eq!(rows[1].opacity, 0.5);
        assert_eq!(rows[2].opacity, 0.5);
    }

    proptest! {
        #[test]
        fn window_never_exceeds_capacity(
            capacity in prop::sample::select(vec![1usize, 7, 11]),
            batch_len in 1usize..40,
            advances in 0usize..200,
        ) {
            let source = batch(batch_len);
            let mut window = FeedWindow::new(capacity, vec![1.0]);
            for _ in 0..advances {
                window.advance(&source);
                prop_assert!(window.len() <= capacity);
            }
            prop_assert_eq!(window.len(), advances.min(capacity));
        }
    }
}
