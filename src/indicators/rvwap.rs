// =============================================================================
// Rolling VWAP with volatility-adjusted bands
// =============================================================================
//
//   rvwap_i  = Σ w_k * hlc3_k / Σ w_k       over the trailing `window` bars
//   devNew_i = ( EMA(TR, min(100, N))_i + σ(hlc3, window)_i ) / 2
//   band     = rvwap ± mult * devNew,        mult ∈ {2.0, 2.5, 3.0, 3.5, 4.0}
//
// Weights are candle volumes. When no candle in the whole series carries a
// volume above zero, every weight is 1 and rvwap degrades to a plain moving
// average of hlc3. That choice is made once per series, never per bar.
//
// SMA and EMA of the close ride along for the chart overlay.
// =============================================================================

use serde::Serialize;
use tracing::trace;

use crate::indicators::atr::true_range_ema;
use crate::indicators::ema::{ema_series, sma_series};
use crate::indicators::stdev::rolling_stdev;
use crate::indicators::BandTier;
use crate::market_data::candle::closes;
use crate::market_data::Candle;

/// Band multipliers, innermost first. Tier 1 (`lb1`/`ub1`) is the one the
/// signal detector reads.
pub const VWAP_BAND_MULTS: [f64; 5] = [2.0, 2.5, 3.0, 3.5, 4.0];

/// Windows for the VWAP engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VwapParams {
    pub window: usize,
    pub sma_length: usize,
    pub ema_length: usize,
}

impl Default for VwapParams {
    fn default() -> Self {
        Self {
            window: 100,
            sma_length: 21,
            ema_length: 45,
        }
    }
}

/// Everything the VWAP engine produces, index-aligned with the candles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VwapResult {
    pub rvwap: Vec<f64>,
    pub sma: Vec<f64>,
    pub ema: Vec<f64>,
    /// devNew: the averaged volatility estimate behind the bands.
    pub dev: Vec<f64>,
    pub bands: [BandTier; 5],
}

impl VwapResult {
    /// Run the full engine over `candles`.
    pub fn compute(candles: &[Candle], params: VwapParams) -> Self {
        let rvwap = rvwap_series(candles, params.window);
        let dev = volatility_series(candles, params.window);
        let bands = VWAP_BAND_MULTS.map(|m| BandTier::around(&rvwap, &dev, m));

        let close = closes(candles);
        Self {
            sma: sma_series(&close, params.sma_length),
            ema: ema_series(&close, params.ema_length),
            rvwap,
            dev,
            bands,
        }
    }

    /// Tier 1 band `(ub1, lb1)` at `index`.
    pub fn inner_band(&self, index: usize) -> Option<(f64, f64)> {
        self.bands[0].at(index)
    }
}

/// Whether any bar carries a usable (positive) volume.
pub fn has_volume(candles: &[Candle]) -> bool {
    candles.iter().any(|c| matches!(c.volume, Some(v) if v > 0.0))
}

/// Volume-weighted moving average of hlc3.
///
/// In a volume-bearing series a bar with no volume field weighs 1; a window
/// whose weights sum to zero is undefined.
pub fn rvwap_series(candles: &[Candle], window: usize) -> Vec<f64> {
    let n = candles.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || n < window {
        trace!(len = n, window, "rvwap: insufficient data");
        return out;
    }

    let weighted = has_volume(candles);
    let weight = |c: &Candle| if weighted { c.volume.unwrap_or(1.0) } else { 1.0 };

    for i in (window - 1)..n {
        let mut sum_pv = 0.0;
        let mut sum_v = 0.0;
        for c in &candles[i + 1 - window..=i] {
            let w = weight(c);
            sum_pv += c.hlc3() * w;
            sum_v += w;
        }
        if sum_v > 0.0 {
            out[i] = sum_pv / sum_v;
        }
    }
    out
}

/// devNew: mean of the TR average and the hlc3 standard deviation.
pub fn volatility_series(candles: &[Candle], window: usize) -> Vec<f64> {
    let tr_avg = true_range_ema(candles);
    let hlc3: Vec<f64> = candles.iter().map(Candle::hlc3).collect();
    let sd = rolling_stdev(&hlc3, window);

    tr_avg
        .iter()
        .zip(&sd)
        .map(|(&a, &s)| {
            if a.is_finite() && s.is_finite() {
                (a + s) / 2.0
            } else {
                f64::NAN
            }
        })
        .collect()
}
