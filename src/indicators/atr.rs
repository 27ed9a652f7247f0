// =============================================================================
// True Range and its exponential average
// =============================================================================
//
// True Range for each bar:
//   TR_0 = H_0 - L_0                       (no previous close)
//   TR_i = max(H - L, |H - prevClose|, |L - prevClose|)
//
// The volatility term of the VWAP bands is an SMA-seeded EMA of TR over
// min(100, N) bars.
// =============================================================================

use crate::indicators::ema::ema_series;
use crate::market_data::Candle;

/// Longest smoothing period used for the TR average.
pub const TR_EMA_PERIOD: usize = 100;

/// True range of every bar, index-aligned with `candles`.
pub fn true_range_series(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let hl = c.high - c.low;
            if i == 0 {
                return hl;
            }
            let prev_close = candles[i - 1].close;
            let hc = (c.high - prev_close).abs();
            let lc = (c.low - prev_close).abs();
            hl.max(hc).max(lc)
        })
        .collect()
}

/// EMA of true range with period `min(TR_EMA_PERIOD, N)`.
pub fn true_range_ema(candles: &[Candle]) -> Vec<f64> {
    let period = TR_EMA_PERIOD.min(candles.len());
    ema_series(&true_range_series(candles), period)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(0, open, high, low, close)
    }

    #[test]
    fn first_bar_uses_range_only() {
        let candles = vec![candle(100.0, 105.0, 95.0, 102.0)];
        assert_eq!(true_range_series(&candles), vec![10.0]);
    }

    #[test]
    fn true_range_uses_prev_close() {
        // Gap up: |115 - 95| = 20 > 115 - 108 = 7
        let candles = vec![
            candle(100.0, 105.0, 95.0, 95.0),
            candle(110.0, 115.0, 108.0, 112.0),
            // Gap down: |100 - 112| = 12 > 104 - 100 = 4
            candle(103.0, 104.0, 100.0, 101.0),
        ];
        assert_eq!(true_range_series(&candles), vec![10.0, 20.0, 12.0]);
    }

    #[test]
    fn short_series_uses_whole_length() {
        // N = 4 < 100: period 4, defined only at the last index.
        let candles: Vec<Candle> = (0..4)
            .map(|i| {
                let base = 100.0 + i as f64;
                candle(base, base + 2.0, base - 2.0, base)
            })
            .collect();
        let ema = true_range_ema(&candles);
        assert!(ema[..3].iter().all(|v| v.is_nan()));
        assert!((ema[3] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn empty_series() {
        assert!(true_range_ema(&[]).is_empty());
    }

    #[test]
    fn long_series_warms_up_at_100() {
        let candles: Vec<Candle> = (0..150)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.1).sin();
                candle(base, base + 1.0, base - 1.0, base)
            })
            .collect();
        let ema = true_range_ema(&candles);
        assert!(ema[98].is_nan());
        assert!(ema[99].is_finite());
        assert!(ema[149].is_finite() && ema[149] > 0.0);
    }
}
