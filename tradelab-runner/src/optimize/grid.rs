//! Exhaustive Cartesian sweep over the parameter grid.
//!
//! Coordinates are enumerated outer-axis-major (axis 0 slowest). Evaluation
//! may run on the rayon pool — each coordinate is a pure function of its
//! parameters — but results are collected back in enumeration order and the
//! best is picked by a sequential reduce, so the first-wins tie-break holds
//! either way.

use rayon::prelude::*;

use tradelab_core::domain::Bar;
use tradelab_core::series::DataSeries;
use tradelab_core::strategy::Strategy;

use crate::objective::Objective;
use crate::parameters::SearchGrid;

use super::{accepts, evaluate, IterationResult, OptimizationResult, OptimizeError, OptimizeOptions};

pub(crate) fn search(
    strategy: &Strategy,
    grid: &SearchGrid,
    objective: &Objective,
    input: &DataSeries<Bar>,
    options: &OptimizeOptions,
) -> Result<OptimizationResult, OptimizeError> {
    let total = grid.size();

    let score = |index: usize| -> Result<IterationResult, OptimizeError> {
        let coordinate = grid.coordinate(index);
        let metric = evaluate(strategy, grid, &coordinate, objective, input)?;
        Ok(IterationResult {
            parameter_values: grid.params(&coordinate),
            metric,
        })
    };

    let results: Vec<IterationResult> = if options.parallel {
        (0..total).into_par_iter().map(score).collect::<Result<_, _>>()?
    } else {
        (0..total).map(score).collect::<Result<_, _>>()?
    };

    let mut best_index = 0;
    for (index, result) in results.iter().enumerate().skip(1) {
        if accepts(
            options.search_direction,
            result.metric,
            results[best_index].metric,
        ) {
            best_index = index;
        }
    }

    let best_result = results[best_index].metric;
    let best_parameter_values = results[best_index].parameter_values.clone();
    Ok(OptimizationResult {
        best_result,
        best_parameter_values,
        all_results: options.record_all_results.then_some(results),
        duration_ms: None,
    })
}
