//! Walk-forward evaluation — alternate in-sample optimization with
//! out-of-sample backtests across sliding windows.
//!
//! Each window optimizes over `in_sample_size` bars, applies the best
//! parameters to the strategy, and backtests the next `out_sample_size`
//! bars it never trained on. The harness advances by one out-of-sample
//! chunk per window and stops when a full out-of-sample window no longer
//! fits. Only out-of-sample trades are returned.

use thiserror::Error;

use tradelab_core::domain::{Bar, Trade};
use tradelab_core::engine::{backtest_with_parameters, BacktestError, BacktestOptions};
use tradelab_core::rng::SeedHierarchy;
use tradelab_core::series::DataSeries;
use tradelab_core::strategy::Strategy;

use crate::objective::Objective;
use crate::optimize::{optimize, OptimizeError, OptimizeOptions};
use crate::parameters::ParameterDef;

/// Options for [`walk_forward_optimize`].
#[derive(Debug, Clone, Default)]
pub struct WalkForwardOptions {
    /// Forwarded to each window's optimization pass; its `random_seed` is
    /// replaced by a per-window sub-seed.
    pub optimize: OptimizeOptions,
    /// Recording options for the out-of-sample backtests.
    pub backtest: BacktestOptions,
    /// Master seed; every window derives its own sub-seed from it.
    pub random_seed: u64,
}

/// Result of a walk-forward run.
#[derive(Debug, Clone)]
pub struct WalkForwardResult {
    /// Concatenated out-of-sample trades, in window order.
    pub trades: Vec<Trade>,
    /// Number of completed windows.
    pub windows: usize,
}

/// Walk-forward failures.
#[derive(Debug, Error)]
pub enum WalkForwardError {
    #[error("in-sample size must be positive")]
    ZeroInSampleSize,

    #[error("out-of-sample size must be positive")]
    ZeroOutSampleSize,

    #[error("input series is empty")]
    EmptyInput,

    #[error("optimization failed on window {window}: {source}")]
    Optimize {
        window: usize,
        #[source]
        source: OptimizeError,
    },

    #[error("out-of-sample backtest failed on window {window}: {source}")]
    Backtest {
        window: usize,
        #[source]
        source: BacktestError,
    },
}

/// Optimize in-sample, evaluate out-of-sample, slide, repeat.
pub fn walk_forward_optimize(
    strategy: &Strategy,
    parameters: &[ParameterDef],
    objective: &Objective,
    input: &DataSeries<Bar>,
    in_sample_size: usize,
    out_sample_size: usize,
    options: &WalkForwardOptions,
) -> Result<WalkForwardResult, WalkForwardError> {
    if in_sample_size == 0 {
        return Err(WalkForwardError::ZeroInSampleSize);
    }
    if out_sample_size == 0 {
        return Err(WalkForwardError::ZeroOutSampleSize);
    }
    if input.is_empty() {
        return Err(WalkForwardError::EmptyInput);
    }

    let seeds = SeedHierarchy::new(options.random_seed);
    let mut trades = Vec::new();
    let mut offset = 0;
    let mut window = 0;

    loop {
        let in_sample = input.skip(offset).take(in_sample_size);
        let out_sample = input.skip(offset + in_sample_size).take(out_sample_size);
        if out_sample.len() < out_sample_size {
            break;
        }

        let mut optimize_options = options.optimize.clone();
        optimize_options.random_seed = seeds.window_seed(window as u64);

        let optimized = optimize(strategy, parameters, objective, &in_sample, &optimize_options)
            .map_err(|source| WalkForwardError::Optimize { window, source })?;

        tracing::debug!(
            window,
            offset,
            best = optimized.best_result,
            "walk-forward window optimized"
        );

        let mut merged = strategy.parameters.clone();
        merged.extend(optimized.best_parameter_values);
        let out_trades =
            backtest_with_parameters(strategy, &merged, &out_sample, &options.backtest)
                .map_err(|source| WalkForwardError::Backtest { window, source })?;
        trades.extend(out_trades);

        offset += out_sample_size;
        window += 1;
    }

    Ok(WalkForwardResult { trades, windows: window })
}
