// Converts upstream values into the shapes the board shows:
// percentages that always sum to 100, and trades in minor units.

use crate::error::{FeedError, FeedResult};
use crate::feed::types::TradeEvent;
use crate::market_data::adapters::{TakerSide, UpstreamTrade};

/// Validate a raw last-price reading. Missing means unavailable, not zero.
pub fn validate_percent(ticker: &str, raw: Option<i64>) -> FeedResult<u8> {
    match raw {
        None => Err(FeedError::Unavailable { ticker: ticker.to_string() }),
        Some(value) if (0..=100).contains(&value) => Ok(value as u8),
        Some(value) => Err(FeedError::OutOfRange { ticker: ticker.to_string(), value }),
    }
}

/// Scale two readings so they sum to exactly 100.
///
/// `a` is rounded, `b` takes whatever is left. Returns `None` for a (0, 0)
/// pair, which carries no information.
pub fn normalise_pair(a: u8, b: u8) -> Option<(u8, u8)> {
    let total = a as u32 + b as u32;
    if total == 0 {
        return None;
    }
    let scaled = ((a as f64 * 100.0) / total as f64).round() as u8;
    Some((scaled, 100 - scaled))
}

pub fn complement(value: u8) -> u8 {
    100u8.saturating_sub(value)
}

/// Map an upstream trade onto a `TradeEvent` labelled `side`.
///
/// The value is `count * price` where the price is whichever side the taker
/// bought. Records that come out non-positive are dropped.
pub fn trade_to_event(trade: &UpstreamTrade, side: &str) -> Option<TradeEvent> {
    let price = match trade.taker_side {
        TakerSide::Yes => trade.yes_price,
        TakerSide::No => trade.no_price,
    };
    let value = trade.count.checked_mul(price)?;
    if value <= 0 {
        return None;
    }
    Some(TradeEvent {
        id: trade.trade_id.clone(),
        value: value as u64,
        side: side.to_string(),
        timestamp: trade.created_time,
        decorative_color_seed: colour_seed(&trade.trade_id),
    })
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

// FNV-1a over the id bytes. Fixed across builds and toolchains, so every
// display gives the same live trade the same colour.
fn colour_seed(trade_id: &str) -> u64 {
    trade_id
        .bytes()
        .fold(FNV_OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(FNV_PRIME))
}
