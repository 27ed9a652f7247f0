// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Each analysis request is a complete,
// independent pass: the handler snapshots the active config, runs the engine
// on the blocking pool and returns the full overlay plus signals.
//
//   422  validation failure (bad config or malformed candles)
//   502  upstream exchange failure
//
// CORS is permissive so a chart front-end can call the server directly.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::{entry_to_entry_excursions, excursions_over_bars};
use crate::app_state::AppState;
use crate::config::EngineConfig;
use crate::engine::analyze;
use crate::market_data::Candle;
use crate::types::Signal;

// =============================================================================
// Router construction
// =============================================================================

/// Build the REST router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/config", get(get_config).post(set_config))
        .route("/api/v1/analyze", post(analyze_candles))
        .route("/api/v1/bybit/analysis", get(bybit_analysis))
        .route("/api/v1/excursions", post(excursions))
        .layer(cors)
        .with_state(state)
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Run the engine off the async executor and map the outcome to a response.
async fn run_analysis(candles: Vec<Candle>, config: EngineConfig) -> Response {
    let outcome = tokio::task::spawn_blocking(move || analyze(&candles, &config)).await;
    match outcome {
        Ok(Ok(analysis)) => Json(analysis).into_response(),
        Ok(Err(e)) => {
            warn!(error = %e, "analysis rejected");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("analysis task failed: {e}"),
        ),
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    config_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        config_version: state.current_config_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Config
// =============================================================================

async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config_snapshot())
}

async fn set_config(
    State(state): State<Arc<AppState>>,
    Json(next): Json<EngineConfig>,
) -> Response {
    match state.replace_config(next) {
        Ok(version) => Json(serde_json::json!({
            "configVersion": version,
            "config": state.config_snapshot(),
        }))
        .into_response(),
        Err(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

// =============================================================================
// Analysis over caller-supplied candles
// =============================================================================

#[derive(Deserialize)]
struct AnalyzeRequest {
    candles: Vec<Candle>,
    /// Overrides the server config for this request only.
    #[serde(default)]
    config: Option<EngineConfig>,
}

async fn analyze_candles(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    let config = req.config.unwrap_or_else(|| state.config_snapshot());
    run_analysis(req.candles, config).await
}

// =============================================================================
// Analysis over exchange klines
// =============================================================================

fn default_symbol() -> String {
    "BANKUSDT".to_string()
}

fn default_interval() -> String {
    "120".to_string()
}

fn default_limit() -> u32 {
    500
}

fn default_category() -> String {
    "linear".to_string()
}

/// Bybit caps one kline page at 1000 rows.
const MAX_KLINE_LIMIT: u32 = 1000;

#[derive(Deserialize)]
struct BybitQuery {
    #[serde(default = "default_symbol")]
    symbol: String,
    #[serde(default = "default_interval")]
    interval: String,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default = "default_category")]
    category: String,
}

async fn bybit_analysis(
    State(state): State<Arc<AppState>>,
    Query(q): Query<BybitQuery>,
) -> Response {
    let symbol = q.symbol.trim().to_uppercase();
    let limit = q.limit.clamp(1, MAX_KLINE_LIMIT);

    let candles = match state
        .bybit
        .get_klines(&symbol, &q.interval, limit, &q.category)
        .await
    {
        Ok(c) => c,
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "kline fetch failed");
            return error_response(StatusCode::BAD_GATEWAY, format!("{e:#}"));
        }
    };

    info!(symbol = %symbol, interval = %q.interval, bars = candles.len(), "klines received");
    run_analysis(candles, state.config_snapshot()).await
}

// =============================================================================
// Excursions
// =============================================================================

fn default_bars() -> usize {
    10
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExcursionRequest {
    candles: Vec<Candle>,
    signals: Vec<Signal>,
    /// Bars inspected after each entry.
    #[serde(default = "default_bars")]
    bars: usize,
    /// Measure each entry up to the next signal instead of a fixed window.
    #[serde(default)]
    entry_to_entry: bool,
}

async fn excursions(Json(req): Json<ExcursionRequest>) -> Response {
    if let Err(e) = crate::market_data::validate_candles(&req.candles) {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
    }
    let reports = if req.entry_to_entry {
        entry_to_entry_excursions(&req.candles, &req.signals)
    } else {
        excursions_over_bars(&req.candles, &req.signals, req.bars)
    };
    Json(reports).into_response()
}
