// =============================================================================
// LRC Signal Engine — Main Entry Point
// =============================================================================
//
//   lrc-signal-engine            one pass: load candles, print the analysis
//   lrc-signal-engine serve      HTTP API on ENGINE_BIND_ADDR
//
// Candles come from the JSON file named by ENGINE_CANDLES, or from the Bybit
// kline endpoint when it is unset.
// =============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{TimeZone, Utc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lrc_signal_engine::analysis::excursions_over_bars;
use lrc_signal_engine::api;
use lrc_signal_engine::app_state::AppState;
use lrc_signal_engine::market_data::BybitClient;
use lrc_signal_engine::{analyze, Candle, EngineConfig};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        LRC Signal Engine — Starting Up                   ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path = PathBuf::from(env_or("ENGINE_CONFIG", "engine_config.json"));
    let config = EngineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        EngineConfig::default()
    });
    config
        .validate()
        .context("engine config failed validation")?;

    let bybit = BybitClient::new()?;

    // ── 2. Mode dispatch ─────────────────────────────────────────────────
    match std::env::args().nth(1).as_deref() {
        Some("serve") => serve(config, config_path, bybit).await,
        Some(other) if other != "analyze" => {
            anyhow::bail!("unknown mode {other:?}; expected `analyze` or `serve`")
        }
        _ => run_once(config, bybit).await,
    }
}

async fn serve(config: EngineConfig, config_path: PathBuf, bybit: BybitClient) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config, Some(config_path), bybit));
    let bind_addr = env_or("ENGINE_BIND_ADDR", "0.0.0.0:8080");

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("Shutdown signal received — stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!("LRC Signal Engine shut down complete.");
    Ok(())
}

async fn load_candles(bybit: &BybitClient) -> anyhow::Result<Vec<Candle>> {
    if let Ok(path) = std::env::var("ENGINE_CANDLES") {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read candles from {path}"))?;
        let candles: Vec<Candle> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse candles from {path}"))?;
        info!(path = %path, bars = candles.len(), "candles loaded from file");
        return Ok(candles);
    }

    let symbol = env_or("ENGINE_SYMBOL", "BANKUSDT").to_uppercase();
    let interval = env_or("ENGINE_INTERVAL", "120");
    let category = env_or("ENGINE_CATEGORY", "linear");
    let limit: u32 = env_parse("ENGINE_LIMIT", 500);

    bybit
        .get_klines(&symbol, &interval, limit, &category)
        .await
        .with_context(|| format!("failed to fetch {symbol} klines"))
}

async fn run_once(config: EngineConfig, bybit: BybitClient) -> anyhow::Result<()> {
    let candles = load_candles(&bybit).await?;
    let analysis = analyze(&candles, &config)?;

    for s in &analysis.signals {
        let at = Utc
            .timestamp_millis_opt(s.time)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| s.time.to_string());
        info!(
            at = %at,
            side = %s.side,
            reason = %s.reason,
            price = s.price,
            add_on = s.add_on.unwrap_or(false),
            "signal"
        );
    }

    let bars: usize = env_parse("ENGINE_EXCURSION_BARS", 10);
    if bars > 0 {
        for r in excursions_over_bars(&candles, &analysis.signals, bars) {
            info!(
                entry = r.entry_number,
                side = %r.side,
                reason = %r.reason,
                mfe_pct = r.max_profit_pct,
                mae_pct = r.max_loss_pct,
                "excursion over {} bars",
                r.bars_observed
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
