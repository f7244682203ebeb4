// Upstream collaborators behind traits, so the reconciler and trade source can
// run against the real exchange or an in-process stand-in.

use chrono::{DateTime, Utc};

use crate::error::FeedResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakerSide {
    Yes,
    No,
}

/// One trade record as reported by the upstream, before it becomes a
/// `TradeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTrade {
    pub trade_id: String,
    pub ticker: String,
    pub count: i64,
    pub yes_price: i64, // cents
    pub no_price: i64,  // cents
    pub taker_side: TakerSide,
    pub created_time: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait OddsSource: Send + Sync {
    /// Last traded probability in percent. `Ok(None)` means the market exists
    /// but has no price, which callers treat as unavailable, never as zero.
    async fn last_price(&self, ticker: &str) -> FeedResult<Option<i64>>;
}

#[async_trait::async_trait]
pub trait TradeHistorySource: Send + Sync {
    /// Up to `limit` recent trades for one market, in whatever order the
    /// upstream returns them.
    async fn recent_trades(&self, ticker: &str, limit: usize) -> FeedResult<Vec<UpstreamTrade>>;
}

pub mod kalshi;
pub mod kalshi_types;
