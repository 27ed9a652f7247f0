// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators behind the channel
// and signal engine. Every series function returns a vector index-aligned to
// its input, with `f64::NAN` marking indices where the indicator is not yet
// defined. Callers test with `is_finite()` before use.

pub mod atr;
pub mod ema;
pub mod linreg;
pub mod lrc;
pub mod rvwap;
pub mod stdev;

use serde::{Deserialize, Serialize};

/// A `{upper, lower}` pair at `mult` deviations either side of a centre line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTier {
    pub mult: f64,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BandTier {
    /// `center ± mult * dev`, undefined wherever either input is.
    pub fn around(center: &[f64], dev: &[f64], mult: f64) -> Self {
        let (upper, lower) = center
            .iter()
            .zip(dev)
            .map(|(&c, &d)| {
                if c.is_finite() && d.is_finite() {
                    (c + mult * d, c - mult * d)
                } else {
                    (f64::NAN, f64::NAN)
                }
            })
            .unzip();

        Self { mult, upper, lower }
    }

    /// `(upper, lower)` at `index`, or `None` if either side is undefined.
    pub fn at(&self, index: usize) -> Option<(f64, f64)> {
        let upper = *self.upper.get(index)?;
        let lower = *self.lower.get(index)?;
        (upper.is_finite() && lower.is_finite()).then_some((upper, lower))
    }
}

/// Value at `index` if it exists and is a real number.
pub(crate) fn defined(series: &[f64], index: usize) -> Option<f64> {
    series.get(index).copied().filter(|v| v.is_finite())
}
