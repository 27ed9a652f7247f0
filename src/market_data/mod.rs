pub mod bybit;
pub mod candle;

// Re-export the Candle struct for convenient access (e.g. `use crate::market_data::Candle`).
pub use bybit::BybitClient;
pub use candle::{validate_candles, Candle};
