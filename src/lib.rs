//! Live odds and trade-feed engine for unattended signage displays.
//!
//! A [`display::Display`] runs three independent tasks: the burst/normal
//! pacing loop that advances the trade window, the trade-source refresh, and
//! the odds poll. Upstream failures never reach the screen; the last good
//! batch and the last good odds stay up, marked stale where it matters.

pub mod config;
pub mod display;
pub mod error;
pub mod feed;
pub mod market_data;
pub mod telemetry;
