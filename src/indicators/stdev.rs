// =============================================================================
// Rolling Standard Deviation
// =============================================================================
//
// Population σ over a trailing window, the same dispersion measure Bollinger
// Bands use:
//
//   mean = Σx / n
//   σ    = sqrt( Σ (x - mean)^2 / n )
//
// Computed from deviations about the window mean rather than E[x²] - mean²,
// so a flat window yields exactly zero instead of a tiny negative variance.

/// Rolling population standard deviation, index-aligned with `values`.
pub fn rolling_stdev(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < period {
        return out;
    }

    let period_f = period as f64;
    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period_f;
        let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period_f;
        out[i] = variance.sqrt();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_value() {
        // [2, 4, 4, 4, 5, 5, 7, 9] has population σ = 2.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = rolling_stdev(&values, 8);
        assert!(sd[6].is_nan());
        assert!((sd[7] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn flat_window_is_zero() {
        let sd = rolling_stdev(&[2.5; 6], 4);
        assert_eq!(sd[5], 0.0);
    }

    #[test]
    fn insufficient_data() {
        assert!(rolling_stdev(&[1.0, 2.0], 3).iter().all(|v| v.is_nan()));
    }
}
