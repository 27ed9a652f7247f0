// =============================================================================
// Excursion Analysis — how far price travelled after each signal
// =============================================================================
//
// For a signal entered at price P on bar s, over a window of bars [s, e]:
//
//   long   profit = (maxHigh - P) / P * 100     loss = (minLow - P) / P * 100
//   short  profit = (P - minLow) / P * 100      loss = (P - maxHigh) / P * 100
//
// Profit is floored at 0 and loss capped at 0, so both read as magnitudes in
// the favourable / adverse direction. The entry bar is part of the window.
//
// First-touch timing counts bars after the entry bar until a favourable
// target percentage is reached.
// =============================================================================

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::trace;

use crate::market_data::Candle;
use crate::types::{Side, Signal, SignalReason};

/// Favourable / adverse move for one signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcursionReport {
    /// 1-based position in the signal list.
    pub entry_number: usize,
    pub side: Side,
    pub reason: SignalReason,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub candle_index: usize,
    /// Bars after the entry bar that were inspected.
    pub bars_observed: usize,
    pub max_profit_pct: f64,
    pub max_loss_pct: f64,
}

/// Bars until each target was first reached, in the order targets were given.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstTouch {
    pub entry_number: usize,
    pub bars: Vec<Option<usize>>,
}

/// Share of signals meeting a timing condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinRate {
    pub label: String,
    pub hits: usize,
    pub rate: f64,
}

/// Index of the candle opened at `time`, if the series has one.
fn candle_index(candles: &[Candle], time: i64) -> Option<usize> {
    candles.binary_search_by_key(&time, |c| c.open_time).ok()
}

fn entry_time(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

fn measure(
    candles: &[Candle],
    entry_number: usize,
    signal: &Signal,
    start: usize,
    end: usize,
) -> Option<ExcursionReport> {
    let price = signal.price;
    if !price.is_finite() || price <= 0.0 {
        trace!(entry_number, price, "excursion: unusable entry price");
        return None;
    }

    let window = &candles[start..=end];
    let high = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);

    let (profit, loss) = match signal.side {
        Side::Long => ((high - price) / price * 100.0, (low - price) / price * 100.0),
        Side::Short => ((price - low) / price * 100.0, (price - high) / price * 100.0),
    };

    Some(ExcursionReport {
        entry_number,
        side: signal.side,
        reason: signal.reason,
        entry_price: price,
        entry_time: entry_time(signal.time),
        candle_index: start,
        bars_observed: end - start,
        max_profit_pct: profit.max(0.0),
        max_loss_pct: loss.min(0.0),
    })
}

/// MFE / MAE over the entry bar and the following `n_bars` bars (clipped at
/// the end of the series). Signals whose bar is not in `candles` are skipped.
pub fn excursions_over_bars(candles: &[Candle], signals: &[Signal], n_bars: usize) -> Vec<ExcursionReport> {
    if candles.is_empty() {
        return Vec::new();
    }
    let last = candles.len() - 1;

    signals
        .iter()
        .enumerate()
        .filter_map(|(k, sig)| {
            let start = candle_index(candles, sig.time)?;
            let end = start.saturating_add(n_bars).min(last);
            measure(candles, k + 1, sig, start, end)
        })
        .collect()
}

/// MFE / MAE from each signal until the bar before the next later signal, or
/// the end of the series for the final one.
pub fn entry_to_entry_excursions(candles: &[Candle], signals: &[Signal]) -> Vec<ExcursionReport> {
    if candles.is_empty() {
        return Vec::new();
    }
    let last = candles.len() - 1;

    signals
        .iter()
        .enumerate()
        .filter_map(|(k, sig)| {
            let start = candle_index(candles, sig.time)?;
            let end = signals[k + 1..]
                .iter()
                .find(|next| next.time > sig.time)
                .and_then(|next| candle_index(candles, next.time))
                .map_or(last, |next_start| next_start.saturating_sub(1).max(start));
            measure(candles, k + 1, sig, start, end)
        })
        .collect()
}

/// For each signal and each favourable target (percent), the number of bars
/// after entry until the target was first reached within `horizon` bars.
pub fn first_touch_bars(
    candles: &[Candle],
    signals: &[Signal],
    targets_pct: &[f64],
    horizon: usize,
) -> Vec<FirstTouch> {
    signals
        .iter()
        .enumerate()
        .filter_map(|(k, sig)| {
            let start = candle_index(candles, sig.time)?;
            let end = start.saturating_add(horizon).min(candles.len() - 1);
            let price = sig.price;
            if !price.is_finite() || price <= 0.0 {
                return None;
            }

            let bars = targets_pct
                .iter()
                .map(|&pct| {
                    (start + 1..=end).find_map(|j| {
                        let c = &candles[j];
                        let reached = match sig.side {
                            Side::Long => c.high >= price * (1.0 + pct / 100.0),
                            Side::Short => c.low <= price * (1.0 - pct / 100.0),
                        };
                        reached.then_some(j - start)
                    })
                })
                .collect();

            Some(FirstTouch {
                entry_number: k + 1,
                bars,
            })
        })
        .collect()
}

fn rate(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Share of `total_signals` whose first touch of target `target` came within
/// each cut-off (`bars <= cutoff`).
pub fn win_rate_cumulative(
    touches: &[FirstTouch],
    target: usize,
    total_signals: usize,
    cutoffs: &[usize],
) -> Vec<WinRate> {
    cutoffs
        .iter()
        .map(|&cutoff| {
            let hits = touches
                .iter()
                .filter(|t| matches!(t.bars.get(target), Some(Some(b)) if *b <= cutoff))
                .count();
            WinRate {
                label: format!("<={cutoff}"),
                hits,
                rate: rate(hits, total_signals),
            }
        })
        .collect()
}

/// Share of `total_signals` whose first touch of target `target` fell in each
/// inclusive `(from, to)` bar window. Windows are expected not to overlap.
pub fn win_rate_exclusive(
    touches: &[FirstTouch],
    target: usize,
    total_signals: usize,
    windows: &[(usize, usize)],
) -> Vec<WinRate> {
    windows
        .iter()
        .map(|&(from, to)| {
            let hits = touches
                .iter()
                .filter(|t| matches!(t.bars.get(target), Some(Some(b)) if (from..=to).contains(b)))
                .count();
            WinRate {
                label: format!("{from}-{to}"),
                hits,
                rate: rate(hits, total_signals),
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: i64, low: f64, high: f64, close: f64) -> Candle {
        Candle::new(i * 1_000, close, high, low, close)
    }

    fn series() -> Vec<Candle> {
        vec![
            bar(0, 99.0, 101.0, 100.0),
            bar(1, 98.0, 104.0, 103.0),
            bar(2, 95.0, 103.0, 96.0),
            bar(3, 96.0, 110.0, 108.0),
            bar(4, 100.0, 109.0, 101.0),
        ]
    }

    fn long_at(i: i64, price: f64) -> Signal {
        Signal::new(i * 1_000, Side::Long, SignalReason::LrcCross, price)
    }

    fn short_at(i: i64, price: f64) -> Signal {
        Signal::new(i * 1_000, Side::Short, SignalReason::Strong, price)
    }

    #[test]
    fn long_excursion_over_two_bars() {
        let reps = excursions_over_bars(&series(), &[long_at(0, 100.0)], 2);
        assert_eq!(reps.len(), 1);
        let r = &reps[0];
        assert_eq!(r.entry_number, 1);
        assert_eq!(r.bars_observed, 2);
        assert!((r.max_profit_pct - 4.0).abs() < 1e-9);
        assert!((r.max_loss_pct + 5.0).abs() < 1e-9);
        assert_eq!(r.entry_time.timestamp_millis(), 0);
    }

    #[test]
    fn short_excursion_reports_adverse_move_as_negative() {
        let reps = excursions_over_bars(&series(), &[short_at(2, 96.0)], 1);
        let r = &reps[0];
        // low 95 => +1.0417% favourable, high 110 => -14.583% adverse
        assert!((r.max_profit_pct - 100.0 / 96.0).abs() < 1e-9);
        assert!((r.max_loss_pct - (96.0 - 110.0) / 96.0 * 100.0).abs() < 1e-9);
        assert!(r.max_loss_pct < 0.0);
    }

    #[test]
    fn window_clips_at_series_end() {
        let reps = excursions_over_bars(&series(), &[long_at(3, 108.0)], 10);
        assert_eq!(reps[0].bars_observed, 1);
    }

    #[test]
    fn unbounded_horizon_clips_without_overflow() {
        let reps = excursions_over_bars(&series(), &[long_at(1, 103.0)], usize::MAX);
        assert_eq!(reps[0].bars_observed, 3);
        assert!((reps[0].max_profit_pct - (110.0 - 103.0) / 103.0 * 100.0).abs() < 1e-9);

        let touches = first_touch_bars(&series(), &[long_at(1, 103.0)], &[5.0], usize::MAX);
        // 103 * 1.05 = 108.15, first reached by bar 3's high of 110.
        assert_eq!(touches[0].bars, vec![Some(2)]);
    }

    #[test]
    fn unknown_time_and_zero_price_are_skipped() {
        let sigs = vec![
            Signal::new(12_345, Side::Long, SignalReason::Early, 100.0),
            long_at(1, 0.0),
            long_at(1, 103.0),
        ];
        let reps = excursions_over_bars(&series(), &sigs, 3);
        assert_eq!(reps.len(), 1);
        assert_eq!(reps[0].entry_number, 3);
    }

    #[test]
    fn entry_to_entry_stops_before_next_signal() {
        let sigs = vec![long_at(0, 100.0), short_at(2, 96.0)];
        let reps = entry_to_entry_excursions(&series(), &sigs);
        // First window: bars 0..=1 => high 104, low 98.
        assert_eq!(reps[0].bars_observed, 1);
        assert!((reps[0].max_profit_pct - 4.0).abs() < 1e-9);
        assert!((reps[0].max_loss_pct + 2.0).abs() < 1e-9);
        // Last runs to the end: bars 2..=4.
        assert_eq!(reps[1].bars_observed, 2);
    }

    #[test]
    fn entry_to_entry_same_bar_signals() {
        let sigs = vec![long_at(1, 103.0), short_at(1, 103.0), long_at(2, 96.0)];
        let reps = entry_to_entry_excursions(&series(), &sigs);
        assert_eq!(reps[0].bars_observed, 0);
        assert_eq!(reps[1].bars_observed, 0);
        assert_eq!(reps[2].bars_observed, 2);
    }

    #[test]
    fn first_touch_and_win_rates() {
        let sigs = vec![long_at(0, 100.0), short_at(1, 103.0)];
        let touches = first_touch_bars(&series(), &sigs, &[3.0, 8.0], 4);
        // long: +3% (103) at bar 1, +8% (108) at bar 3
        assert_eq!(touches[0].bars, vec![Some(1), Some(3)]);
        // short: -3% (99.91) at bar 2 (low 95), -8% (94.76) never
        assert_eq!(touches[1].bars, vec![Some(1), None]);

        let cum = win_rate_cumulative(&touches, 0, sigs.len(), &[1, 2]);
        assert_eq!(cum[0].hits, 2);
        assert!((cum[0].rate - 1.0).abs() < 1e-12);
        assert_eq!(cum[0].label, "<=1");

        let excl = win_rate_exclusive(&touches, 1, sigs.len(), &[(1, 2), (3, 4)]);
        assert_eq!(excl[0].hits, 0);
        assert_eq!(excl[1].hits, 1);
        assert!((excl[1].rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_inputs() {
        assert!(excursions_over_bars(&[], &[long_at(0, 1.0)], 5).is_empty());
        assert!(entry_to_entry_excursions(&series(), &[]).is_empty());
        assert!(win_rate_cumulative(&[], 0, 0, &[1])[0].rate == 0.0);
    }
}
