//! Random-restart hill climbing over the parameter grid.
//!
//! Each restart draws a uniform random coordinate from the grid, then walks
//! to the first improving neighbor (each axis stepped up, then down) until
//! no neighbor improves. Every fresh evaluation also contends for the
//! global best, and a per-run cache keeps any coordinate from being
//! backtested twice.

use std::collections::{HashMap, HashSet};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

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
    let restarts = options.num_starting_points.max(1);
    let mut rng = ChaCha8Rng::seed_from_u64(options.random_seed);

    let mut run = Run {
        strategy,
        grid,
        objective,
        input,
        record_all: options.record_all_results,
        cache: HashMap::new(),
        all_results: Vec::new(),
    };

    let mut visited_starts: HashSet<Vec<usize>> = HashSet::new();
    let mut best: Option<(Vec<usize>, f64)> = None;

    for _ in 0..restarts {
        let start: Vec<usize> = (0..grid.num_axes())
            .map(|axis| rng.gen_range(0..grid.axis_len(axis)))
            .collect();
        if !visited_starts.insert(start.clone()) {
            continue;
        }

        let mut working = start;
        let mut working_metric = run.score(&working)?;
        update_best(&mut best, &working, working_metric, options);

        // First-improvement local search: move to the first neighbor that
        // strictly beats the working result, then rescan from there.
        loop {
            let mut moved = false;
            for neighbor in grid.neighbors(&working) {
                let metric = run.score(&neighbor)?;
                update_best(&mut best, &neighbor, metric, options);
                if accepts(options.search_direction, metric, working_metric) {
                    working = neighbor;
                    working_metric = metric;
                    moved = true;
                    break;
                }
            }
            if !moved {
                break;
            }
        }
    }

    let (best_coordinate, best_result) =
        best.expect("at least one starting point was evaluated");
    Ok(OptimizationResult {
        best_result,
        best_parameter_values: grid.params(&best_coordinate),
        all_results: options.record_all_results.then_some(run.all_results),
        duration_ms: None,
    })
}

/// Per-run evaluation state: the coordinate→metric cache and the evaluation
/// log.
struct Run<'a> {
    strategy: &'a Strategy,
    grid: &'a SearchGrid,
    objective: &'a Objective,
    input: &'a DataSeries<Bar>,
    record_all: bool,
    cache: HashMap<Vec<usize>, f64>,
    all_results: Vec<IterationResult>,
}

impl Run<'_> {
    fn score(&mut self, coordinate: &[usize]) -> Result<f64, OptimizeError> {
        if let Some(&metric) = self.cache.get(coordinate) {
            return Ok(metric);
        }
        let metric = evaluate(self.strategy, self.grid, coordinate, self.objective, self.input)?;
        self.cache.insert(coordinate.to_vec(), metric);
        if self.record_all {
            self.all_results.push(IterationResult {
                parameter_values: self.grid.params(coordinate),
                metric,
            });
        }
        Ok(metric)
    }
}

fn update_best(
    best: &mut Option<(Vec<usize>, f64)>,
    coordinate: &[usize],
    metric: f64,
    options: &OptimizeOptions,
) {
    match best {
        Some((_, best_metric)) if !accepts(options.search_direction, metric, *best_metric) => {}
        _ => *best = Some((coordinate.to_vec(), metric)),
    }
}
