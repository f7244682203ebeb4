//! Layered configuration: defaults, then an optional TOML file, then
//! `LIVEFEED__*` environment variables.

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TradeMode {
    Synthetic,
    Live,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub display: DisplayConfig,
    pub pacing: PacingConfig,
    pub trades: TradesConfig,
    pub odds: OddsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub window_size: usize,
    pub opacities: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub burst_probability: f64,
    pub burst_intervals_ms: Vec<u64>,
    pub burst_lengths: Vec<u32>,
    pub normal_intervals_ms: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradesConfig {
    pub mode: TradeMode,
    /// Pinned seed: generate once and cycle. Unset: seed from start-up time and
    /// regenerate every `regenerate_every_secs`.
    pub seed: Option<u64>,
    pub batch_size: usize,
    pub regenerate_every_secs: u64,
    pub candidates: Vec<String>,
    pub live_poll_every_secs: u64,
    pub live_limit: usize,
    pub markets: Vec<MarketLabel>,
}

/// A tracked market and the outcome label its trades are shown under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarketLabel {
    pub ticker: String,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OddsConfig {
    pub poll_interval_ms: u64,
    pub primary: String,
    /// Complement market; unset or empty means outcome B is derived as 100 - A.
    pub secondary: Option<String>,
    /// Shown for outcome A until the first successful poll.
    pub initial_primary: u8,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elections.kalshi.com/trade-api/v2".into(),
            timeout_secs: 10,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_size: 7,
            opacities: vec![1.0, 1.0, 0.8, 0.6, 0.4, 0.2, 0.1],
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            burst_probability: 0.25,
            burst_intervals_ms: vec![400, 450, 500],
            burst_lengths: vec![4, 6, 8],
            normal_intervals_ms: vec![1800, 2000, 2200],
        }
    }
}

impl Default for TradesConfig {
    fn default() -> Self {
        Self {
            mode: TradeMode::Synthetic,
            seed: None,
            batch_size: crate::feed::synthetic::DEFAULT_BATCH_SIZE,
            regenerate_every_secs: 30,
            candidates: vec!["MAMDANI".into(), "CUOMO".into()],
            live_poll_every_secs: 30,
            live_limit: 50,
            markets: Vec::new(),
        }
    }
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            primary: "KXMAYORNYCPARTY-25-D".into(),
            secondary: Some("KXMAYORNYCPARTY-25-AC".into()),
            initial_primary: 50,
        }
    }
}

impl AppConfig {
    /// Build from an optional file plus environment overrides, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("LIVEFEED")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("trades.candidates")
                    .with_list_parse_key("display.opacities"),
            )
            .build()?;

        let cfg: AppConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pacing.validate()?;
        if self.display.window_size == 0 {
            return Err(ConfigError::Invalid("display.window_size must be > 0".into()));
        }
        if self.trades.candidates.is_empty() {
            return Err(ConfigError::Invalid("trades.candidates must not be empty".into()));
        }
        if self.trades.mode == TradeMode::Live && self.trades.markets.is_empty() {
            return Err(ConfigError::Invalid("live trade mode needs trades.markets".into()));
        }
        if self.odds.primary.is_empty() {
            return Err(ConfigError::Invalid("odds.primary must be set".into()));
        }
        if self.odds.initial_primary > 100 {
            return Err(ConfigError::Invalid("odds.initial_primary must be within 0..=100".into()));
        }
        if self.odds.poll_interval_ms == 0
            || self.trades.regenerate_every_secs == 0
            || self.trades.live_poll_every_secs == 0
        {
            return Err(ConfigError::Invalid("poll periods must be > 0".into()));
        }
        Ok(())
    }
}

impl PacingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.burst_probability) {
            return Err(ConfigError::Invalid(format!(
                "pacing.burst_probability {} outside [0, 1]",
                self.burst_probability
            )));
        }
        if self.burst_intervals_ms.is_empty() || self.normal_intervals_ms.is_empty() {
            return Err(ConfigError::Invalid("pacing interval sets must not be empty".into()));
        }
        if self.burst_lengths.is_empty() || self.burst_lengths.contains(&0) {
            return Err(ConfigError::Invalid("pacing.burst_lengths must be non-empty and > 0".into()));
        }
        if self.burst_intervals_ms.contains(&0) || self.normal_intervals_ms.contains(&0) {
            return Err(ConfigError::Invalid("pacing intervals must be > 0".into()));
        }
        Ok(())
    }
}
