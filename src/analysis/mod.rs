// =============================================================================
// Post-signal analysis
// =============================================================================
//
// Consumers of the signal list: how far price moved after each entry and how
// quickly favourable targets were reached.

pub mod excursion;

pub use excursion::{
    entry_to_entry_excursions, excursions_over_bars, first_touch_bars, win_rate_cumulative,
    win_rate_exclusive, ExcursionReport, FirstTouch, WinRate,
};
