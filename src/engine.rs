// =============================================================================
// Analysis pipeline — candles + config in, overlay series + signals out
// =============================================================================
//
//   validate  ->  regression / LRC channel  ->  VWAP engine  ->  detectors
//
// Every call is a complete, independent pass over the full history. Nothing
// is cached between calls and the input slice is never mutated, so identical
// inputs always produce identical output and a stale result can simply be
// dropped by the caller.
// =============================================================================

use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::indicators::linreg::apply_legacy_offset;
use crate::indicators::lrc::LrcChannel;
use crate::indicators::rvwap::VwapResult;
use crate::indicators::BandTier;
use crate::market_data::candle::{closes, validate_candles};
use crate::market_data::Candle;
use crate::signals::detect_signals;
use crate::types::Signal;

/// Full output of one pass, index-aligned with the input candles. Undefined
/// values serialise as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub bars: usize,
    pub mid: Vec<f64>,
    /// Midline as drawn: equal to `mid` unless the legacy offset is enabled.
    pub display_mid: Vec<f64>,
    pub slope: Vec<f64>,
    pub residual_std: Vec<f64>,
    pub lrc_bands: [BandTier; 3],
    pub mid_rising: Vec<Option<bool>>,
    pub vwap: VwapResult,
    pub signals: Vec<Signal>,
}

/// Validate, then run the whole pipeline.
///
/// A series shorter than the configured windows is not an error: affected
/// indices are NaN and the detectors stay silent there.
pub fn analyze(candles: &[Candle], config: &EngineConfig) -> Result<Analysis, ValidationError> {
    config.validate()?;
    validate_candles(candles)?;

    let channel = LrcChannel::compute(&closes(candles), config.length, config.band_mults());
    let vwap = VwapResult::compute(candles, config.vwap_params());
    let signals = detect_signals(candles, &channel, &vwap, config);

    let display_mid = if config.legacy_mid_offset {
        apply_legacy_offset(&channel.regression)
    } else {
        channel.mid().to_vec()
    };

    debug!(
        bars = candles.len(),
        length = config.length,
        vwap_window = config.vwap_window,
        first_mid = channel.mid().iter().position(|v| v.is_finite()),
        first_band = vwap.bands[0].upper.iter().position(|v| v.is_finite()),
        "analysis pass complete"
    );
    info!(
        bars = candles.len(),
        signals = signals.len(),
        "signals computed"
    );

    let mid_rising = channel.rising();
    let LrcChannel { regression, tiers } = channel;

    Ok(Analysis {
        bars: candles.len(),
        mid: regression.mid,
        display_mid,
        slope: regression.slope,
        residual_std: regression.residual_std,
        lrc_bands: tiers,
        mid_rising,
        vwap,
        signals,
    })
}
