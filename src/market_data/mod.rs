// Market data module entrypoint
pub mod adapters;   // upstream fetchers (Kalshi REST)
pub mod normaliser; // upstream readings -> board values
pub mod reconciler; // odds polling with last-good-value retention
