// =============================================================================
// Signal Detector — LRC x RVWAP multi-tier signals
// =============================================================================
//
// Four independent detectors, each scanned over bars i >= 1:
//
//   LRC_CROSS  close crosses the LRC midline (optionally slope-gated)
//   EARLY      close beyond LRC tier 2 while lb1 < close < ub1
//                long: close < lower2     short: close > upper2
//   STRONG     close beyond LRC tier 2 AND the inner VWAP band
//                long: close < lb1 && close < lower2
//                short: close > ub1 && close > upper2
//   SUPER      wick beyond LRC tier 3 AND the inner VWAP band
//                long: low < lower3 && low < lb1
//                short: high > upper3 && high > ub1
//
// Detectors are not mutually exclusive: a bar may fire several reasons and,
// for SUPER on a wide bar, both sides. A detector whose inputs are undefined
// at a bar is skipped at that bar only.
//
// Each detector produces its own chronological pass; the passes are merged by
// time with detector order (the order above) as the stable tie-break.
// =============================================================================

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::indicators::lrc::{cross_at, CrossMode, LrcChannel};
use crate::indicators::rvwap::VwapResult;
use crate::market_data::candle::closes;
use crate::market_data::Candle;
use crate::types::{Side, Signal, SignalReason};

/// Detector evaluation order; also the tie-break order on a shared bar.
pub const DETECTOR_ORDER: [SignalReason; 4] = [
    SignalReason::LrcCross,
    SignalReason::Early,
    SignalReason::Strong,
    SignalReason::Super,
];

/// Read-only view of everything the detectors need.
struct DetectorContext<'a> {
    candles: &'a [Candle],
    closes: Vec<f64>,
    channel: &'a LrcChannel,
    vwap: &'a VwapResult,
    mode: CrossMode,
}

/// `(long, short)` firing flags for one detector at one bar.
type Hits = (bool, bool);

impl<'a> DetectorContext<'a> {
    fn hits(&self, reason: SignalReason, i: usize) -> Option<Hits> {
        match reason {
            SignalReason::LrcCross => Some(self.lrc_cross(i)),
            SignalReason::Early => self.early(i),
            SignalReason::Strong => self.strong(i),
            SignalReason::Super => self.super_touch(i),
        }
    }

    fn lrc_cross(&self, i: usize) -> Hits {
        match cross_at(&self.closes, self.channel, i, self.mode) {
            Some(Side::Long) => (true, false),
            Some(Side::Short) => (false, true),
            None => (false, false),
        }
    }

    fn early(&self, i: usize) -> Option<Hits> {
        let close = self.closes[i];
        let (upper2, lower2) = self.channel.tier(2).at(i)?;
        let (ub1, lb1) = self.vwap.inner_band(i)?;

        let in_cloud = close > lb1 && close < ub1;
        Some((in_cloud && close < lower2, in_cloud && close > upper2))
    }

    fn strong(&self, i: usize) -> Option<Hits> {
        let close = self.closes[i];
        let (upper2, lower2) = self.channel.tier(2).at(i)?;
        let (ub1, lb1) = self.vwap.inner_band(i)?;

        Some((
            close < lb1 && close < lower2,
            close > ub1 && close > upper2,
        ))
    }

    fn super_touch(&self, i: usize) -> Option<Hits> {
        let bar = &self.candles[i];
        let (upper3, lower3) = self.channel.tier(3).at(i)?;
        let (ub1, lb1) = self.vwap.inner_band(i)?;

        Some((
            bar.low < lower3 && bar.low < lb1,
            bar.high > upper3 && bar.high > ub1,
        ))
    }

    /// One detector over the whole history, ascending by bar.
    fn scan(&self, reason: SignalReason) -> Vec<Signal> {
        let mut out = Vec::new();
        let mut suppressed = 0usize;

        for i in 1..self.candles.len() {
            let Some((long, short)) = self.hits(reason, i) else {
                suppressed += 1;
                continue;
            };
            let bar = &self.candles[i];
            if long {
                out.push(Signal::new(bar.open_time, Side::Long, reason, bar.close));
            }
            if short {
                out.push(Signal::new(bar.open_time, Side::Short, reason, bar.close));
            }
        }

        trace!(%reason, fired = out.len(), suppressed, "detector pass");
        out
    }
}

/// Run every enabled detector and return the merged, annotated signal list.
pub fn detect_signals(
    candles: &[Candle],
    channel: &LrcChannel,
    vwap: &VwapResult,
    config: &EngineConfig,
) -> Vec<Signal> {
    let toggles = config.signals;
    if !toggles.any() || candles.len() < 2 {
        return Vec::new();
    }

    let ctx = DetectorContext {
        candles,
        closes: closes(candles),
        channel,
        vwap,
        mode: config.cross_mode(),
    };

    let passes: Vec<Vec<Signal>> = DETECTOR_ORDER
        .iter()
        .filter(|reason| match reason {
            SignalReason::LrcCross => toggles.enable_lrc_cross,
            SignalReason::Early => toggles.enable_early,
            SignalReason::Strong => toggles.enable_strong,
            SignalReason::Super => toggles.enable_super,
        })
        .map(|&reason| ctx.scan(reason))
        .collect();

    let mut merged = merge_signals(passes);
    annotate_add_ons(&mut merged);

    debug!(bars = candles.len(), signals = merged.len(), mode = ?ctx.mode, "signals detected");
    merged
}

/// Concatenate signal lists and sort by time. The sort is stable, so signals
/// sharing a time keep the order in which their lists were supplied.
pub fn merge_signals(groups: Vec<Vec<Signal>>) -> Vec<Signal> {
    let mut merged: Vec<Signal> = groups.into_iter().flatten().collect();
    merged.sort_by_key(|s| s.time);
    merged
}

/// Mark each signal whose predecessor in the list points the same way.
pub fn annotate_add_ons(signals: &mut [Signal]) {
    let mut prev_side: Option<Side> = None;
    for sig in signals.iter_mut() {
        sig.add_on = Some(prev_side == Some(sig.side));
        prev_side = Some(sig.side);
    }
}
