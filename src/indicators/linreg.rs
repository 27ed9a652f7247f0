// =============================================================================
// Rolling Linear Regression (OLS over a trailing window)
// =============================================================================
//
// For every index i >= L-1, fit y = a*x + b over the L most recent samples
// with x = 0..L-1 (x = 0 is the oldest sample) and evaluate at x = L-1:
//
//   a    = (L*Sxy - Sx*Sy) / (L*Sxx - Sx^2)
//   b    = (Sy - a*Sx) / L
//   mid  = a*(L-1) + b
//   σres = sqrt( Σ (r_k - r̄)^2 / (L-1) ),   r_k = y_k - (a*x_k + b)
//
// Indices before the window fills carry f64::NAN. Sx and Sxx depend only on
// L and are computed once per call.
// =============================================================================

use tracing::trace;

/// Index-aligned regression output. Every vector has the input's length.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionSeries {
    pub slope: Vec<f64>,
    pub mid: Vec<f64>,
    pub residual_std: Vec<f64>,
}

impl RegressionSeries {
    fn undefined(n: usize) -> Self {
        Self {
            slope: vec![f64::NAN; n],
            mid: vec![f64::NAN; n],
            residual_std: vec![f64::NAN; n],
        }
    }

    pub fn len(&self) -> usize {
        self.mid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mid.is_empty()
    }
}

/// Fit the trailing-window regression at every index of `src`.
///
/// `length < 2` has no meaningful fit; the boundary rejects it before this
/// runs, and here it simply yields an all-undefined series.
pub fn rolling_linear_regression(src: &[f64], length: usize) -> RegressionSeries {
    let n = src.len();
    let mut out = RegressionSeries::undefined(n);

    if length < 2 || n < length {
        trace!(len = n, length, "linreg: insufficient data");
        return out;
    }

    let len_f = length as f64;
    let sx: f64 = (0..length).map(|x| x as f64).sum();
    let sxx: f64 = (0..length).map(|x| (x * x) as f64).sum();
    let denom = len_f * sxx - sx * sx;

    for i in (length - 1)..n {
        let window = &src[i + 1 - length..=i];

        let mut sy = 0.0;
        let mut sxy = 0.0;
        for (x, &y) in window.iter().enumerate() {
            sy += y;
            sxy += x as f64 * y;
        }

        let a = (len_f * sxy - sx * sy) / denom;
        let b = (sy - a * sx) / len_f;

        let resid_mean = window
            .iter()
            .enumerate()
            .map(|(x, &y)| y - (a * x as f64 + b))
            .sum::<f64>()
            / len_f;
        let variance = window
            .iter()
            .enumerate()
            .map(|(x, &y)| {
                let r = y - (a * x as f64 + b) - resid_mean;
                r * r
            })
            .sum::<f64>()
            / (len_f - 1.0);

        out.slope[i] = a;
        out.mid[i] = a * (len_f - 1.0) + b;
        out.residual_std[i] = variance.sqrt();
    }

    out
}

/// Midline shifted back by one bar's worth of slope (`mid - slope`).
///
/// Older chart revisions drew the line this way; it is presentation only and
/// never feeds the band tiers or the detectors.
pub fn apply_legacy_offset(series: &RegressionSeries) -> Vec<f64> {
    series
        .mid
        .iter()
        .zip(&series.slope)
        .map(|(&m, &a)| m - a)
        .collect()
}
