// Kalshi REST adapter: market odds and public trade history.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::kalshi_types::{MarketResponse, TradesResponse};
use super::{OddsSource, TradeHistorySource, UpstreamTrade};
use crate::error::{FeedError, FeedResult};

pub struct KalshiAdapter {
    client: reqwest::Client,
    base_url: String, // e.g. "https://api.elections.kalshi.com/trade-api/v2"
}

impl KalshiAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FeedError::Http { url: base_url.to_string(), source })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> FeedResult<T> {
        let res = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| FeedError::Http { url: url.to_string(), source })?;

        let status = res.status();
        if !status.is_success() {
            return Err(FeedError::Status { url: url.to_string(), status: status.as_u16() });
        }

        let body = res
            .text()
            .await
            .map_err(|source| FeedError::Http { url: url.to_string(), source })?;
        serde_json::from_str(&body).map_err(|e| FeedError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl OddsSource for KalshiAdapter {
    #[instrument(skip(self))]
    async fn last_price(&self, ticker: &str) -> FeedResult<Option<i64>> {
        let url = format!("{}/markets/{}", self.base_url, ticker);
        let res: MarketResponse = self.get_json(&url, &[]).await?;
        let price = res.market.and_then(|m| m.last_price);
        debug!(ticker, price = ?price, "Fetched market odds");
        Ok(price)
    }
}

#[async_trait::async_trait]
impl TradeHistorySource for KalshiAdapter {
    #[instrument(skip(self))]
    async fn recent_trades(&self, ticker: &str, limit: usize) -> FeedResult<Vec<UpstreamTrade>> {
        let url = format!("{}/markets/trades", self.base_url);
        let query = [("ticker", ticker.to_string()), ("limit", limit.to_string())];
        let res: TradesResponse = self.get_json(&url, &query).await?;
        debug!(ticker, count = res.trades.len(), "Fetched trade history");
        Ok(res.trades.into_iter().map(UpstreamTrade::from).collect())
    }
}
