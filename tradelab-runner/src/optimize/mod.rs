//! Parameter optimization over the backtest oracle.
//!
//! Both searches clone nothing but parameter buckets: each candidate
//! coordinate is overlaid on the strategy's own parameters and run through
//! `backtest_with_parameters`. The accept rule is a strict inequality, so
//! the first coordinate reaching the optimum wins on ties.

mod grid;
mod hill_climb;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradelab_core::domain::Bar;
use tradelab_core::engine::{backtest_with_parameters, BacktestError, BacktestOptions};
use tradelab_core::series::DataSeries;
use tradelab_core::strategy::{Params, Strategy};

use crate::objective::Objective;
use crate::parameters::{ParameterDef, ParameterError, SearchGrid};

/// Direction of metric improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchDirection {
    #[default]
    Max,
    Min,
}

/// Which search algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizationType {
    #[default]
    Grid,
    HillClimb,
}

/// Options for [`optimize`].
#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    pub search_direction: SearchDirection,
    pub optimization_type: OptimizationType,
    /// Record every evaluated coordinate, in evaluation order.
    pub record_all_results: bool,
    /// Time the run and report it in `duration_ms`.
    pub record_duration: bool,
    /// Hill climb: number of random restarts.
    pub num_starting_points: usize,
    /// Hill climb: seed for the restart draws.
    pub random_seed: u64,
    /// Grid: evaluate coordinates on the rayon pool.
    pub parallel: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            search_direction: SearchDirection::Max,
            optimization_type: OptimizationType::Grid,
            record_all_results: false,
            record_duration: false,
            num_starting_points: 4,
            random_seed: 0,
            parallel: true,
        }
    }
}

/// One evaluated coordinate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationResult {
    pub parameter_values: Params,
    pub metric: f64,
}

/// Result of an optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// Best objective metric seen.
    pub best_result: f64,
    /// The swept parameter values achieving `best_result` (overrides only,
    /// not the strategy's full bucket).
    pub best_parameter_values: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_results: Option<Vec<IterationResult>>,
    #[serde(rename = "durationMS", default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Optimization failures.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("no parameters to optimize: the definitions list is empty")]
    NoParameters,

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error("backtest failed during optimization: {0}")]
    Backtest(#[from] BacktestError),
}

/// Search a strategy's parameter space for the objective-optimal values.
pub fn optimize(
    strategy: &Strategy,
    parameters: &[ParameterDef],
    objective: &Objective,
    input: &DataSeries<Bar>,
    options: &OptimizeOptions,
) -> Result<OptimizationResult, OptimizeError> {
    if parameters.is_empty() {
        return Err(OptimizeError::NoParameters);
    }
    let grid = SearchGrid::build(parameters)?;
    let started = options.record_duration.then(Instant::now);

    let mut result = match options.optimization_type {
        OptimizationType::Grid => grid::search(strategy, &grid, objective, input, options)?,
        OptimizationType::HillClimb => {
            hill_climb::search(strategy, &grid, objective, input, options)?
        }
    };

    if let Some(started) = started {
        result.duration_ms = Some(started.elapsed().as_millis() as u64);
    }
    tracing::debug!(
        best = result.best_result,
        coordinates = grid.size(),
        "optimization finished"
    );
    Ok(result)
}

/// Strict-improvement accept rule.
pub(crate) fn accepts(direction: SearchDirection, candidate: f64, best: f64) -> bool {
    match direction {
        SearchDirection::Max => candidate > best,
        SearchDirection::Min => candidate < best,
    }
}

/// Score one coordinate: overlay it on the strategy's parameters, run the
/// backtest, reduce with the objective.
pub(crate) fn evaluate(
    strategy: &Strategy,
    grid: &SearchGrid,
    coordinate: &[usize],
    objective: &Objective,
    input: &DataSeries<Bar>,
) -> Result<f64, OptimizeError> {
    let mut merged = strategy.parameters.clone();
    merged.extend(grid.params(coordinate));
    let trades = backtest_with_parameters(strategy, &merged, input, &BacktestOptions::default())?;
    Ok(objective(&trades))
}
