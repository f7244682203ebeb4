use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use livefeed_rs::config::{AppConfig, TradeMode};
use livefeed_rs::display::{Display, Frame};
use livefeed_rs::market_data::adapters::kalshi::KalshiAdapter;
use livefeed_rs::telemetry;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "livefeed", about = "Live odds and trade feed for signage displays")]
struct Args {
    /// TOML config file; missing file means defaults plus environment
    #[arg(long, default_value = "livefeed.toml")]
    config: PathBuf,

    /// Pin the synthetic seed so every display shows the same feed
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    mode: Option<TradeMode>,

    #[arg(long, default_value = "info")]
    log_filter: String,

    /// Prometheus port (only with the `metrics-exporter` feature)
    #[arg(long, default_value_t = 9000)]
    metrics_port: u16,
}

// Console stand-in for the signage renderer.
fn render(frame: &Frame) {
    let stale = if frame.odds.is_stale { " (stale)" } else { "" };
    println!("\n=== {}% | {}%{} ===", frame.odds.outcome_a, frame.odds.outcome_b, stale);
    for row in &frame.trades {
        println!(
            "  [{:.2}] {} {:>14} on {}",
            row.opacity,
            row.event.swatch(),
            row.event.display_amount(),
            row.event.side
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // load .env

    let args = Args::parse();
    telemetry::init_tracing(&args.log_filter);
    telemetry::init_metrics(args.metrics_port)?;

    let mut cfg = AppConfig::load(Some(args.config.as_path()))?;
    if args.seed.is_some() {
        cfg.trades.seed = args.seed;
    }
    if let Some(mode) = args.mode {
        cfg.trades.mode = mode;
    }
    cfg.validate()?;

    let adapter = Arc::new(KalshiAdapter::new(
        &cfg.api.base_url,
        Duration::from_secs(cfg.api.timeout_secs),
    )?);
    info!(base_url = adapter.base_url(), "Using market data endpoint");

    let display = Display::from_config(&cfg, adapter.clone(), adapter, Utc::now());
    let mut trades = display.subscribe_trades();
    let mut odds = display.subscribe_odds();

    loop {
        tokio::select! {
            changed = trades.changed() => if changed.is_err() { break },
            changed = odds.changed() => if changed.is_err() { break },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
        render(&display.frame());
    }

    display.shutdown().await;
    Ok(())
}
