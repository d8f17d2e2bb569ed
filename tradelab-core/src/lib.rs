//! tradelab core engine
//!
//! Deterministic bar-by-bar backtesting for rule-based trading strategies.
//! Feeds a time-ordered OHLCV series through user-supplied entry, exit, and
//! risk rules and emits the completed trades with full exit attribution.

pub mod domain;
pub mod engine;
pub mod lookback;
pub mod rng;
pub mod series;
pub mod strategy;
