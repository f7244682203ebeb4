//! Synthetic trade batches for displays that have no live trade data.
//!
//! Everything here is a pure function of `(seed, candidates, size, anchor)`,
//! so two displays configured alike render the same feed.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::feed::rng::{RandomSource, SeededRng};
use crate::feed::types::TradeEvent;

pub const DEFAULT_BATCH_SIZE: usize = 200;

const LOOKBACK_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Value tiers as (cumulative probability, low, span).
const VALUE_TIERS: [(f64, u64, u64); 4] = [
    (0.05, 10_000, 90_000),
    (0.25, 1_000, 9_000),
    (0.50, 100, 900),
    (1.00, 1, 99),
];

/// Draw a trade value: one draw picks the tier, a second picks the value.
pub fn draw_value<R: RandomSource>(rng: &mut R) -> u64 {
    let roll = rng.next_f64();
    let (_, low, span) = VALUE_TIERS
        .iter()
        .copied()
        .find(|(cutoff, _, _)| roll < *cutoff)
        .unwrap_or(VALUE_TIERS[VALUE_TIERS.len() - 1]);
    rng.uniform(low, span)
}

/// Generate `size` trades spread over the 24h before `anchor`, newest first.
///
/// Returns an empty batch when there are no candidates to attribute trades to.
pub fn generate_batch(
    seed: u64,
    candidates: &[String],
    size: usize,
    anchor: DateTime<Utc>,
) -> Vec<TradeEvent> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut rng = SeededRng::new(seed);
    let mut batch: Vec<TradeEvent> = (0..size)
        .map(|i| {
            let side = candidates[rng.pick(candidates.len())].clone();
            let value = draw_value(&mut rng);
            let back_ms = (rng.next_f64() * LOOKBACK_MS) as i64;
            TradeEvent {
                id: format!("synthetic-{}-{}", seed, i),
                value,
                side,
                timestamp: anchor - Duration::milliseconds(back_ms),
                decorative_color_seed: i as u64,
            }
        })
        .collect();

    // stable, so equal timestamps keep generation order
    batch.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    debug!(seed, size = batch.len(), "Generated synthetic trade batch");
    batch
}
