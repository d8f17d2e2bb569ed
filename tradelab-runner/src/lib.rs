//! tradelab runner
//!
//! The layers on top of the core backtest engine: parameter optimization
//! (grid search and random-restart hill climbing), walk-forward evaluation,
//! Monte Carlo trade resampling, and equity/drawdown reductions.

pub mod metrics;
pub mod monte_carlo;
pub mod objective;
pub mod optimize;
pub mod parameters;
pub mod walk_forward;
