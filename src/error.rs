/// Upstream failures. All of them are recoverable: callers log, keep the last
/// good value and try again on the next period.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },

    #[error("odds value {value} for {ticker} outside 0..=100")]
    OutOfRange { ticker: String, value: i64 },

    #[error("no odds available for {ticker}")]
    Unavailable { ticker: String },
}

pub type FeedResult<T> = Result<T, FeedError>;
