// =============================================================================
// Simple and Exponential Moving Averages
// =============================================================================
//
// EMA gives more weight to recent values than the SMA.
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = x_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The first EMA value, at index `period - 1`, is seeded with the SMA of the
// first `period` values. Both series are index-aligned with their input and
// carry NaN before the warm-up index.
// =============================================================================

use tracing::trace;

/// Trailing simple moving average.
///
/// # Edge cases
/// - `period == 0` or `values.len() < period` => all NaN
pub fn sma_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        trace!(len = n, period, "sma: insufficient data");
        return out;
    }

    let period_f = period as f64;
    for i in (period - 1)..n {
        let sum: f64 = values[i + 1 - period..=i].iter().sum();
        out[i] = sum / period_f;
    }
    out
}

/// SMA-seeded exponential moving average.
///
/// # Edge cases
/// - `period == 0` or `values.len() < period` => all NaN
/// - A non-finite input after the seed stops the series; every later index
///   stays NaN rather than carrying a poisoned average forward.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        trace!(len = n, period, "ema: insufficient data");
        return out;
    }

    let multiplier = 2.0 / (period + 1) as f64;

    // Seed: SMA of the first `period` values.
    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return out;
    }
    out[period - 1] = seed;

    let mut prev = seed;
    for i in period..n {
        let ema = values[i] * multiplier + prev * (1.0 - multiplier);
        if !ema.is_finite() {
            break;
        }
        out[i] = ema;
        prev = ema;
    }

    out
}
