//! Equity and drawdown reductions over a completed-trade list.
//!
//! Pure functions: trades in, curve out. Equity compounds each trade's
//! multiplicative growth, so the curves compose with `monte_carlo` samples
//! as well as raw backtest output.

use tradelab_core::domain::Trade;

/// Compound the starting capital through each trade's growth.
///
/// The curve has one more point than there are trades; index 0 is the
/// starting capital.
pub fn compute_equity_curve(starting_capital: f64, trades: &[Trade]) -> Vec<f64> {
    assert!(starting_capital > 0.0, "starting capital must be positive");
    let mut curve = Vec::with_capacity(trades.len() + 1);
    let mut equity = starting_capital;
    curve.push(equity);
    for trade in trades {
        equity *= trade.growth;
        curve.push(equity);
    }
    curve
}

/// Equity shortfall from the running peak after each trade. Never positive.
pub fn compute_drawdown(starting_capital: f64, trades: &[Trade]) -> Vec<f64> {
    assert!(starting_capital > 0.0, "starting capital must be positive");
    let mut drawdown = Vec::with_capacity(trades.len() + 1);
    let mut equity = starting_capital;
    let mut peak = starting_capital;
    drawdown.push(0.0);
    for trade in trades {
        equity *= trade.growth;
        if equity > peak {
            peak = equity;
        }
        drawdown.push(equity - peak);
    }
    drawdown
}
