//! Objective reductions from a completed-trade list to a scalar.
//!
//! Optimizers rank candidate parameter sets by an objective. Any
//! `Fn(&[Trade]) -> f64` works; the functions here cover the common cases.

use tradelab_core::domain::Trade;

/// An objective reduces a trade list to a single comparable metric.
pub type Objective = dyn Fn(&[Trade]) -> f64 + Send + Sync;

/// Sum of per-trade profit.
pub fn total_profit(trades: &[Trade]) -> f64 {
    trades.iter().map(|t| t.profit).sum()
}

/// Gross wins over gross losses.
///
/// No losses and at least one win is infinitely good; no trades at all
/// scores zero.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_win: f64 = trades.iter().filter(|t| t.profit > 0.0).map(|t| t.profit).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.profit < 0.0)
        .map(|t| -t.profit)
        .sum();
    if gross_loss == 0.0 {
        if gross_win > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        gross_win / gross_loss
    }
}

/// Number of completed trades.
pub fn trade_count(trades: &[Trade]) -> f64 {
    trades.len() as f64
}
