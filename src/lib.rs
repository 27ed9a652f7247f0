// =============================================================================
// LRC Signal Engine
// =============================================================================
//
// Linear-regression channel, rolling VWAP bands and four independent signal
// detectors over an OHLC(V) candle series. `engine::analyze` is the single
// entry point; everything it returns is index-aligned with the input candles.
// =============================================================================

pub mod analysis;
pub mod api;
pub mod app_state;
pub mod config;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod signals;
pub mod types;

pub use config::{EngineConfig, SignalToggles};
pub use engine::{analyze, Analysis};
pub use error::ValidationError;
pub use market_data::Candle;
pub use types::{Side, Signal, SignalReason};
