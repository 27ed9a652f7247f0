// =============================================================================
// HTTP API
// =============================================================================
//
// REST surface over the analysis engine: on-demand analysis of supplied or
// exchange-fetched candles, live config, and excursion reports.

pub mod rest;

pub use rest::router;
