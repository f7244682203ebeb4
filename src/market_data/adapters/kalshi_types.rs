// Source: https://api.elections.kalshi.com/trade-api/v2 (GET /markets/{ticker}, GET /markets/trades)

use chrono::{DateTime, Utc};

use super::{TakerSide, UpstreamTrade};

#[derive(Debug, serde::Deserialize)]
pub struct MarketResponse {
    #[serde(default)]
    pub market: Option<Market>,
}

#[derive(Debug, serde::Deserialize)]
pub struct Market {
    #[serde(default)]
    pub last_price: Option<i64>, // cents == percent for binary contracts
}

#[derive(Debug, serde::Deserialize)]
pub struct TradesResponse {
    #[serde(default)]
    pub trades: Vec<Trade>,
}

#[derive(Debug, serde::Deserialize)]
pub struct Trade {
    pub trade_id: String,
    pub ticker: String,
    pub count: i64,
    pub yes_price: i64,
    pub no_price: i64,
    pub taker_side: String, // "yes" | "no"
    pub created_time: DateTime<Utc>,
}

impl From<Trade> for UpstreamTrade {
    fn from(t: Trade) -> Self {
        let taker_side = if t.taker_side.eq_ignore_ascii_case("yes") {
            TakerSide::Yes
        } else {
            TakerSide::No
        };
        UpstreamTrade {
            trade_id: t.trade_id,
            ticker: t.ticker,
            count: t.count,
            yes_price: t.yes_price,
            no_price: t.no_price,
            taker_side,
            created_time: t.created_time,
        }
    }
}
