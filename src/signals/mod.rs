// =============================================================================
// Signals Module
// =============================================================================
//
// Directional signal detection over the LRC channel and the VWAP bands:
// - Independent LRC_CROSS / EARLY / STRONG / SUPER detectors
// - Chronological merge with a stable tie-break
// - Add-on annotation for same-side follow-ups

pub mod detector;

pub use detector::{annotate_add_ons, detect_signals, merge_signals, DETECTOR_ORDER};
