//! Odds polling with "keep the last good value" semantics.
//!
//! A poll that cannot produce a trustworthy reading leaves the numbers on
//! screen untouched and only flips `is_stale`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::FeedResult;
use crate::market_data::adapters::OddsSource;
use crate::market_data::normaliser::{complement, normalise_pair, validate_percent};

/// Latest reconciled odds. `outcome_a + outcome_b == 100` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OddsSnapshot {
    pub outcome_a: u8,
    pub outcome_b: u8,
    pub last_updated: DateTime<Utc>,
    pub is_stale: bool,
}

impl OddsSnapshot {
    /// Seed value shown before the first successful poll; starts stale.
    pub fn initial(outcome_a: u8, at: DateTime<Utc>) -> Self {
        let outcome_a = outcome_a.min(100);
        Self {
            outcome_a,
            outcome_b: complement(outcome_a),
            last_updated: at,
            is_stale: true,
        }
    }
}

pub struct OddsReconciler {
    source: Arc<dyn OddsSource>,
    primary: String,
    secondary: Option<String>,
    snapshot: OddsSnapshot,
}

impl OddsReconciler {
    pub fn new(
        source: Arc<dyn OddsSource>,
        primary: &str,
        secondary: Option<&str>,
        initial: OddsSnapshot,
    ) -> Self {
        Self {
            source,
            primary: primary.to_string(),
            secondary: secondary.filter(|s| !s.is_empty()).map(str::to_string),
            snapshot: initial,
        }
    }

    pub fn snapshot(&self) -> OddsSnapshot {
        self.snapshot
    }

    /// Fetch, validate and commit one round of odds.
    #[instrument(skip(self), fields(primary = %self.primary))]
    pub async fn poll(&mut self) -> OddsSnapshot {
        let (a, b) = match &self.secondary {
            Some(secondary) => {
                let (a, b) = futures::join!(self.fetch(&self.primary), self.fetch(secondary));
                (a, Some(b))
            }
            None => (self.fetch(&self.primary).await, None),
        };

        let reading = match (a, b) {
            (Ok(a), Some(Ok(b))) => match normalise_pair(a, b) {
                Some(pair) => Some(pair),
                None => {
                    warn!(a, b, "Both markets report zero, ignoring reading");
                    None
                }
            },
            (Ok(a), None) => Some((a, complement(a))),
            (Ok(a), Some(Err(e))) => {
                warn!(error = %e, "Secondary market unavailable, deriving complement");
                Some((a, complement(a)))
            }
            (Err(e), Some(Ok(b))) => {
                warn!(error = %e, "Primary market unavailable, deriving complement");
                Some((complement(b), b))
            }
            (Err(e), None) => {
                warn!(error = %e, "Odds unavailable, keeping last known values");
                None
            }
            (Err(ea), Some(Err(eb))) => {
                warn!(primary_error = %ea, secondary_error = %eb, "Odds unavailable, keeping last known values");
                None
            }
        };

        match reading {
            Some((outcome_a, outcome_b)) => {
                self.snapshot = OddsSnapshot {
                    outcome_a,
                    outcome_b,
                    last_updated: Utc::now(),
                    is_stale: false,
                };
                debug!(outcome_a, outcome_b, "Odds updated");
            }
            None => {
                self.snapshot.is_stale = true;
                metrics::counter!("livefeed_odds_poll_failures_total").increment(1);
            }
        }
        metrics::gauge!("livefeed_odds_stale").set(if self.snapshot.is_stale { 1.0 } else { 0.0 });
        self.snapshot
    }

    async fn fetch(&self, ticker: &str) -> FeedResult<u8> {
        let raw = self.source.last_price(ticker).await?;
        validate_percent(ticker, raw)
    }
}
