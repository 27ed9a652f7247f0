// =============================================================================
// Bybit v5 REST client — public kline endpoint
// =============================================================================
//
// Public market data only; no signing. Bybit returns rows newest-first with
// every number string-encoded:
//   [startTime, open, high, low, close, volume, turnover]
// Rows are re-sorted by start time so the engine receives them oldest-first.
// =============================================================================

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

use crate::market_data::Candle;

const DEFAULT_BASE_URL: &str = "https://api.bybit.com";

/// Thin client for the exchange kline endpoint. Retries are the caller's call.
#[derive(Clone)]
pub struct BybitClient {
    base_url: String,
    client: reqwest::Client,
}

impl BybitClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into();
        debug!(%base_url, "BybitClient initialised");

        Ok(Self { base_url, client })
    }

    /// GET /v5/market/kline.
    ///
    /// `interval` uses Bybit notation (`1`, `5`, `60`, `120`, `D`, ...) and
    /// `category` is one of `linear`, `spot`, `inverse`.
    #[instrument(skip(self), name = "bybit::get_klines")]
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
        category: &str,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/v5/market/kline?category={}&symbol={}&interval={}&limit={}",
            self.base_url, category, symbol, interval, limit
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /v5/market/kline request failed")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse kline response")?;

        if !status.is_success() {
            anyhow::bail!("Bybit GET /v5/market/kline returned {}: {}", status, body);
        }

        let candles = parse_kline_body(&body)?;
        debug!(symbol, interval, count = candles.len(), "klines fetched");
        Ok(candles)
    }
}

/// Parse the JSON envelope returned by `/v5/market/kline`.
pub fn parse_kline_body(body: &serde_json::Value) -> Result<Vec<Candle>> {
    let ret_code = body["retCode"].as_i64().unwrap_or(-1);
    if ret_code != 0 {
        let msg = body["retMsg"].as_str().unwrap_or("unknown error");
        anyhow::bail!("Bybit kline error {ret_code}: {msg}");
    }

    let rows = body["result"]["list"]
        .as_array()
        .context("kline response has no result.list array")?;

    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        let arr = row.as_array().context("kline row is not an array")?;
        if arr.len() < 6 {
            warn!("skipping malformed kline row with {} elements", arr.len());
            continue;
        }

        let open_time = arr[0]
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| arr[0].as_i64())
            .context("failed to parse startTime as i64")?;
        let open = parse_string_f64(&arr[1], "open")?;
        let high = parse_string_f64(&arr[2], "high")?;
        let low = parse_string_f64(&arr[3], "low")?;
        let close = parse_string_f64(&arr[4], "close")?;
        let volume = parse_string_f64(&arr[5], "volume")?;

        candles.push(Candle::new(open_time, open, high, low, close).with_volume(volume));
    }

    candles.sort_by_key(|c| c.open_time);
    Ok(candles)
}

/// Bybit sends numeric values as JSON strings.
fn parse_string_f64(val: &serde_json::Value, name: &str) -> Result<f64> {
    match val {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("field {name} is not a valid f64")),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_and_orders_oldest_first() {
        let body = json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "category": "linear",
                "symbol": "BTCUSDT",
                "list": [
                    ["1700007200000", "101", "103", "100", "102", "12.5", "1270"],
                    ["1700000000000", "100", "102", "99", "101", "10", "1000"]
                ]
            }
        });

        let candles = parse_kline_body(&body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time, 1_700_000_000_000);
        assert_eq!(candles[1].open_time, 1_700_007_200_000);
        assert_eq!(candles[1].volume, Some(12.5));
        assert!((candles[0].high - 102.0).abs() < 1e-12);
    }

    #[test]
    fn error_envelope_is_reported() {
        let body = json!({ "retCode": 10001, "retMsg": "params error", "result": {} });
        let err = parse_kline_body(&body).unwrap_err();
        assert!(err.to_string().contains("params error"));
    }

    #[test]
    fn short_rows_are_skipped() {
        let body = json!({
            "retCode": 0,
            "result": { "list": [["1700000000000", "1", "2"]] }
        });
        assert!(parse_kline_body(&body).unwrap().is_empty());
    }

    #[test]
    fn bad_number_fails() {
        let body = json!({
            "retCode": 0,
            "result": { "list": [["1700000000000", "x", "2", "1", "1.5", "3"]] }
        });
        assert!(parse_kline_body(&body).is_err());
    }
}
