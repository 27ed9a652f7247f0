// =============================================================================
// Linear Regression Channel (LRC)
// =============================================================================
//
// Midline from the rolling regression, plus three band tiers:
//
//   upperK = mid + kK * σres
//   lowerK = mid - kK * σres        (k1, k2, k3 default 2.0 / 2.0 / 3.0)
//
// Crossing rules, evaluated for i >= 1 and only when mid[i-1] and mid[i] are
// both defined:
//
//   long   close[i-1] <= mid[i-1]  and  close[i] > mid[i]
//   short  close[i-1] >= mid[i-1]  and  close[i] < mid[i]
//
// The slope-filtered variant additionally needs slope[i] > 0 (long) or
// slope[i] < 0 (short).
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::linreg::{rolling_linear_regression, RegressionSeries};
use crate::indicators::{defined, BandTier};
use crate::types::Side;

/// Channel midline, slope and the three band tiers, index-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct LrcChannel {
    pub regression: RegressionSeries,
    pub tiers: [BandTier; 3],
}

impl LrcChannel {
    /// Fit the regression over `closes` and derive the band tiers.
    pub fn compute(closes: &[f64], length: usize, mults: [f64; 3]) -> Self {
        let regression = rolling_linear_regression(closes, length);
        Self::from_regression(regression, mults)
    }

    pub fn from_regression(regression: RegressionSeries, mults: [f64; 3]) -> Self {
        let tiers = mults.map(|m| BandTier::around(&regression.mid, &regression.residual_std, m));
        Self { regression, tiers }
    }

    pub fn mid(&self) -> &[f64] {
        &self.regression.mid
    }

    pub fn slope(&self) -> &[f64] {
        &self.regression.slope
    }

    /// Tier 1, 2 or 3.
    pub fn tier(&self, n: usize) -> &BandTier {
        &self.tiers[n - 1]
    }

    /// Per index: `Some(true)` when the midline rose or held against the
    /// previous bar, `Some(false)` when it fell, `None` when undefined.
    pub fn rising(&self) -> Vec<Option<bool>> {
        let mid = self.mid();
        (0..mid.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                let prev = defined(mid, i - 1)?;
                let cur = defined(mid, i)?;
                Some(cur >= prev)
            })
            .collect()
    }
}

/// How midline crosses are gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossMode {
    /// Price crossing alone.
    Simple,
    /// Price crossing in the direction of the regression slope.
    SlopeFiltered,
}

/// A close-over-midline crossing at `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cross {
    pub index: usize,
    pub side: Side,
}

/// Evaluate the crossing rule at a single bar.
pub fn cross_at(closes: &[f64], channel: &LrcChannel, index: usize, mode: CrossMode) -> Option<Side> {
    if index == 0 || index >= closes.len() {
        return None;
    }

    let mid = channel.mid();
    let prev_mid = defined(mid, index - 1)?;
    let cur_mid = defined(mid, index)?;
    let prev_close = closes[index - 1];
    let cur_close = closes[index];

    let slope = channel.slope()[index];
    let gate = |side: Side| match mode {
        CrossMode::Simple => true,
        CrossMode::SlopeFiltered => match side {
            Side::Long => slope > 0.0,
            Side::Short => slope < 0.0,
        },
    };

    if prev_close <= prev_mid && cur_close > cur_mid && gate(Side::Long) {
        return Some(Side::Long);
    }
    if prev_close >= prev_mid && cur_close < cur_mid && gate(Side::Short) {
        return Some(Side::Short);
    }
    None
}

/// All midline crossings in ascending index order.
pub fn detect_crosses(closes: &[f64], channel: &LrcChannel, mode: CrossMode) -> Vec<Cross> {
    (1..closes.len())
        .filter_map(|index| cross_at(closes, channel, index, mode).map(|side| Cross { index, side }))
        .collect()
}
